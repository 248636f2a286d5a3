use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::process::ExitCode;

use weavegen::core::diag::{CompileError, format_error};
use weavegen::driver::{CompilationUnit, CompileOptions, DumpFlags, compile_unit};

#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input source file paths. Each input expects the structural decoder's
    /// output as a sibling `<input>.json` file.
    inputs: Vec<PathBuf>,

    /// Directory the generated files are written to
    #[clap(long, default_value = "Generated")]
    output_dir: PathBuf,

    /// Template bundle directory (embedded defaults when omitted)
    #[clap(long)]
    templates: Option<PathBuf>,

    /// Comma-separated list of things to dump: tokens,ast,graph
    #[clap(long)]
    dump: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut dump = DumpFlags::default();
    if let Some(list) = &args.dump {
        for item in list.split(',').map(|s| s.trim().to_lowercase()) {
            match item.as_str() {
                "tokens" => dump.tokens = true,
                "ast" => dump.ast = true,
                "graph" => dump.graph = true,
                "" => {}
                _ => {
                    eprintln!("[WARN] unknown dump flag: {item}");
                }
            }
        }
    }

    let options = CompileOptions {
        templates: args.templates.clone(),
        dump,
    };

    let mut worst_exit = 0;
    for input in &args.inputs {
        let unit = match CompilationUnit::load(input) {
            Ok(unit) => unit,
            Err(error) => {
                eprintln!("[ERROR] {error}");
                worst_exit = worst_exit.max(error.exit_code());
                continue;
            }
        };

        match compile_unit(&unit, &options) {
            Ok(generated) => {
                if let Err(e) = std::fs::create_dir_all(&args.output_dir) {
                    eprintln!("[ERROR] failed to create {}: {e}", args.output_dir.display());
                    worst_exit = worst_exit.max(1);
                    continue;
                }
                for file in generated {
                    let path = args.output_dir.join(&file.path);
                    match std::fs::write(&path, &file.text) {
                        Ok(()) => println!("[SUCCESS] wiring written to {}", path.display()),
                        Err(e) => {
                            eprintln!("[ERROR] failed to write {}: {e}", path.display());
                            worst_exit = worst_exit.max(1);
                        }
                    }
                }
            }
            Err(error) => {
                report(&unit, &error);
                worst_exit = worst_exit.max(error.exit_code());
            }
        }
    }

    ExitCode::from(worst_exit as u8)
}

/// Pipeline errors carry a span and render with a source snippet; driver
/// errors print plainly.
fn report(unit: &CompilationUnit, error: &CompileError) {
    match error.span() {
        Some(span) => {
            eprint!("{}", format_error(&unit.file.source, span, error));
        }
        None => eprintln!("[ERROR] {error}"),
    }
}

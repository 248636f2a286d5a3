use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::decl::Declaration;
use crate::core::diag::{CompileError, SourceFile};
use crate::core::generate::{GeneratedFile, Generator, TemplateBundle};
use crate::core::inspect::Inspector;
use crate::core::lexer::Lexer;
use crate::core::parse::Parser;

/// One source file plus the declaration dictionaries the structural decoder
/// produced for it.
pub struct CompilationUnit {
    pub file: SourceFile,
    pub declarations: Vec<Declaration>,
}

impl CompilationUnit {
    /// Loads a source file and its decoder output, expected as a sibling
    /// `<input>.json` file.
    pub fn load(source_path: &Path) -> Result<Self, CompileError> {
        let source = std::fs::read_to_string(source_path)
            .map_err(|e| CompileError::Io(source_path.to_path_buf(), e))?;

        let decls_path = PathBuf::from(format!("{}.json", source_path.display()));
        let decls_text = std::fs::read_to_string(&decls_path)
            .map_err(|e| CompileError::Io(decls_path.clone(), e))?;
        let declarations = serde_json::from_str(&decls_text)
            .map_err(|e| CompileError::Decode(decls_path, e))?;

        Ok(CompilationUnit {
            file: SourceFile::new(source_path, source),
            declarations,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DumpFlags {
    pub tokens: bool,
    pub ast: bool,
    pub graph: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Template bundle directory; the embedded defaults when absent.
    pub templates: Option<PathBuf>,
    pub dump: DumpFlags,
}

/// Runs the pipeline for one unit: lex, parse, inspect, generate. Fails fast
/// on the first error; the caller decides whether to continue with other
/// units.
pub fn compile_unit(
    unit: &CompilationUnit,
    options: &CompileOptions,
) -> Result<Vec<GeneratedFile>, CompileError> {
    info!(file = %unit.file.path.display(), "compiling");

    let tokens = Lexer::new(&unit.file).tokenize(&unit.declarations)?;
    debug!(count = tokens.len(), "lexed");
    if options.dump.tokens {
        println!("Tokens:");
        println!("--------------------------------");
        for (i, token) in tokens.iter().enumerate() {
            println!("{}: {} @ {}", i, token, token.span);
        }
        println!("--------------------------------");
    }

    let ast = Parser::new(&tokens, &unit.file).parse()?;
    if options.dump.ast {
        println!("AST:");
        println!("--------------------------------");
        print!("{ast}");
        println!("--------------------------------");
    }

    let graph = Inspector::new(&unit.file).inspect(&ast)?;
    debug!(
        types = graph.types.len(),
        dependencies = graph.nodes.len(),
        "graph validated"
    );
    if options.dump.graph {
        println!("Graph:");
        println!("--------------------------------");
        for node in &graph.nodes {
            println!(
                "{}.{}: {} ({})",
                graph.types[node.declaring_type].qualified_name,
                node.name,
                node.abstract_type,
                node.kind
            );
        }
        println!("--------------------------------");
    }

    let bundle = match &options.templates {
        Some(dir) => TemplateBundle::load(dir)?,
        None => TemplateBundle::builtin(),
    };
    Ok(Generator::new(bundle).generate(&ast))
}

#[cfg(test)]
#[path = "../tests/t_compile.rs"]
mod tests;

//! Per-unit orchestration around the core pipeline. All file I/O lives here;
//! the core exposes pure functions over owned inputs.

mod compile;

pub use compile::{CompilationUnit, CompileOptions, DumpFlags, compile_unit};

//! Library surface of the echo compiler: a small-statically-typed-language
//! front end that lexes, parses, analyses, and emits portable C. `echoc`
//! (`main.rs`) is a thin CLI wrapper around the `Compiler` type exported
//! here; embedding the compiler in another tool only needs this crate.

pub mod compiler;

pub use compiler::{CompileError, Compiler};
pub use echo_compiler_common::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity};

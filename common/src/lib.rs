//! Shared data model for the echo compiler: structured diagnostics, the
//! source-to-C type mapping table, and the hard-coded builtin function
//! table the import resolver draws from. Kept in its own crate the way the
//! original compiler keeps its cross-cutting definitions in `common`, so a
//! downstream consumer (for instance a language-server front end) can
//! depend on the data model without pulling in the lexer/parser/emitter.

mod builtins;
mod diagnostics;
mod types;

pub use builtins::{find_by_qualified_name, functions_in_module, module_exists, short_name,
    BuiltinFunction, BUILTIN_FUNCTIONS};
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticKind, Severity};
pub use types::{PrimitiveType, SourceType};

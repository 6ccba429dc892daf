pub mod ast;
pub mod backend;
pub mod import_resolver;
pub mod lexer;
pub mod parser;
pub mod semantic;

use std::fs;
use std::path::Path;

use echo_compiler_common::DiagnosticBag;
use log::debug;
use thiserror::Error;

use self::ast::SymbolTable;
use self::backend::{BackEndGenerator, CEmitter};
use self::parser::{AstParser, RecursiveDescentParser};
use self::semantic::SemanticAnalyser;

/// Failures that abort the whole run before a single diagnostic gets a
/// chance to be raised (§7): the source couldn't be read, or the generated
/// C couldn't be written. Anything about the *program being compiled* is a
/// `Diagnostic` in the returned `DiagnosticBag`, never one of these.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("failed to read source file {path}: {source}")]
    Read { path: String, source: std::io::Error },

    #[error("failed to write output file {path}: {source}")]
    Write { path: String, source: std::io::Error },
}

/// Runs one source file through the full pipeline (§2): lex + parse,
/// resolve imports, three-pass semantic analysis, then emit C. A `Compiler`
/// is cheap to construct and holds nothing but the file name used to tag
/// diagnostics.
pub struct Compiler {
    file: String,
}

impl Compiler {
    pub fn new(file: impl Into<String>) -> Self {
        Compiler { file: file.into() }
    }

    /// Compiles `source` in memory. Returns the generated C translation unit
    /// if compilation succeeded (no `Severity::Error` diagnostic was
    /// raised), alongside every diagnostic collected along the way in
    /// emission order; `None` means at least one declaration failed to
    /// analyse and nothing should be written out.
    pub fn compile_str(&self, source: &str) -> (Option<String>, DiagnosticBag) {
        debug!("lexing and parsing {}", self.file);
        let parser = RecursiveDescentParser::new(source, self.file.clone());
        let (mut ast, mut diagnostics) = parser.parse();
        let program = ast.root();

        debug!("resolving imports");
        let mut symbols = SymbolTable::new();
        import_resolver::resolve_imports(&ast, program, &mut symbols, &mut diagnostics, &self.file);

        debug!("running semantic analysis");
        let result = SemanticAnalyser::new(&mut ast, symbols, self.file.clone()).analyse(program);
        diagnostics.extend(result.diagnostics);

        if diagnostics.has_errors() {
            return (None, diagnostics);
        }

        debug!("emitting C");
        let generated = CEmitter::new().generate(&ast, program, &result.structs, &result.monomorphizer);
        (Some(generated), diagnostics)
    }

    /// Reads `source_path` and compiles it, per `compile_str`.
    pub fn compile_file(&self, source_path: &Path) -> Result<(Option<String>, DiagnosticBag), CompileError> {
        let source = fs::read_to_string(source_path).map_err(|source| CompileError::Read {
            path: source_path.display().to_string(),
            source,
        })?;
        Ok(self.compile_str(&source))
    }

    /// Reads `source_path`, compiles it, and writes the generated C to
    /// `dest_path` only if compilation produced no errors. Returns every
    /// diagnostic collected either way, so the caller can print warnings
    /// even on a successful run.
    pub fn compile_and_save(&self, source_path: &Path, dest_path: &Path) -> Result<DiagnosticBag, CompileError> {
        let (generated, diagnostics) = self.compile_file(source_path)?;
        if let Some(code) = generated {
            fs::write(dest_path, code).map_err(|source| CompileError::Write {
                path: dest_path.display().to_string(),
                source,
            })?;
        }
        Ok(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_program_with_no_diagnostics() {
        let compiler = Compiler::new("t.ec");
        let (generated, diagnostics) = compiler.compile_str("fn main() -> i32 { return 0; }");
        assert!(!diagnostics.has_errors());
        assert!(generated.unwrap().contains("int32_t main(void)"));
    }

    #[test]
    fn undefined_symbol_aborts_without_generated_output() {
        let compiler = Compiler::new("t.ec");
        let (generated, diagnostics) = compiler.compile_str("fn main() -> i32 { return x; }");
        assert!(diagnostics.has_errors());
        assert!(generated.is_none());
    }
}

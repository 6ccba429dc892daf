use std::fmt;
use strum_macros::Display as StrumDisplay;

/// Severity of a diagnostic. Only `Error` affects the process exit code;
/// `Warning` and `Info` are purely informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// The full diagnostic taxonomy produced anywhere in the pipeline.
/// Grouped the way the error design groups them, not alphabetically,
/// so related kinds stay close together when new ones are added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
#[allow(non_camel_case_types)]
pub enum DiagnosticKind {
    // Type errors
    TypeMismatch,
    IncompatibleTypes,
    InvalidOperation,
    InvalidCast,
    UndefinedField,
    UndefinedType,
    InvalidAutoUsage,

    // Symbol errors
    UndefinedSymbol,
    RedefinedSymbol,
    OutOfScope,

    // Function-shape errors
    UndefinedFunction,
    WrongArgumentCount,
    WrongArgumentType,
    MissingReturn,
    UnreachableCode,

    // Memory-hygiene warnings (diagnostic only, no dataflow proof)
    DoubleFree,
    MemoryLeak,
    NullDereference,
    UninitializedVariable,

    // Control-flow errors
    InvalidBreak,
    InvalidContinue,
    DeadCode,

    // Driver-level
    FileIo,
    ParseError,
}

impl DiagnosticKind {
    /// A small subset of kinds abort the current top-level declaration the
    /// moment they are raised at `Severity::Error`, per the error design:
    /// type mismatch, undefined symbol, and redefined symbol.
    pub fn is_fatal_for(&self, severity: Severity) -> bool {
        severity == Severity::Error
            && matches!(
                self,
                DiagnosticKind::TypeMismatch
                    | DiagnosticKind::UndefinedSymbol
                    | DiagnosticKind::RedefinedSymbol
            )
    }
}

/// A single structured diagnostic: what went wrong, how badly, and where.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        severity: Severity,
        line: usize,
        column: usize,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            kind,
            severity,
            line,
            column,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal_for(self.severity)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {} ({:?})",
            self.file, self.line, self.column, self.severity, self.message, self.kind
        )
    }
}

/// Accumulates diagnostics across the whole pipeline so a single run of the
/// compiler can report as many problems as it finds rather than stopping at
/// the first one. Diagnostics are kept in emission order.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Returns true if this diagnostic should abort the
    /// caller's current top-level declaration (the "fatal" subset at error
    /// severity).
    pub fn push(&mut self, diagnostic: Diagnostic) -> bool {
        let fatal = diagnostic.is_fatal();
        if diagnostic.severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
        fatal
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Folds another bag's diagnostics into this one, in order, preserving
    /// each diagnostic's own error-count contribution. Used by the driver to
    /// merge parse/import-resolution diagnostics with the semantic pass's.
    pub fn extend(&mut self, other: DiagnosticBag) {
        for diagnostic in other.diagnostics {
            self.push(diagnostic);
        }
    }
}

impl fmt::Display for DiagnosticBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_subset_only_trips_on_error_severity() {
        let warning = Diagnostic::new(
            DiagnosticKind::UndefinedSymbol,
            Severity::Warning,
            1,
            1,
            "a.ec",
            "x",
        );
        assert!(!warning.is_fatal());

        let error = Diagnostic::new(
            DiagnosticKind::UndefinedSymbol,
            Severity::Error,
            1,
            1,
            "a.ec",
            "x",
        );
        assert!(error.is_fatal());
    }

    #[test]
    fn bag_counts_errors_but_not_warnings() {
        let mut bag = DiagnosticBag::new();
        bag.push(Diagnostic::new(
            DiagnosticKind::UninitializedVariable,
            Severity::Warning,
            1,
            1,
            "a.ec",
            "maybe uninitialized",
        ));
        assert!(!bag.has_errors());
        bag.push(Diagnostic::new(
            DiagnosticKind::UndefinedFunction,
            Severity::Error,
            2,
            1,
            "a.ec",
            "no such function",
        ));
        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 1);
    }
}

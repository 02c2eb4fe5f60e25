//! Diagnostic messages emitted during compilation.

use std::path::PathBuf;

use crate::Span;

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[salsa::accumulator]
pub struct Diagnostic {
    /// Path of the module the span points into.
    pub path: PathBuf,
    pub message: String,
    pub span: Span,
    pub kind: DiagnosticKind,
    pub severity: DiagnosticSeverity,
    pub phase: CompilationPhase,
}

/// The seven classes of problems the front end can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Syntax,
    AssignableTo,
    CannotFindName,
    AlreadyDeclared,
    Misc,
    CannotFindModule,
    CannotFindExport,
}

/// Severity level of a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// Compilation phase where a diagnostic was emitted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompilationPhase {
    Parsing,
    NameResolution,
    TypeChecking,
}

impl Diagnostic {
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

impl std::fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "ERROR"),
            DiagnosticSeverity::Warning => write!(f, "WARNING"),
            DiagnosticSeverity::Info => write!(f, "INFO"),
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            DiagnosticKind::Syntax => "syntax",
            DiagnosticKind::AssignableTo => "assignable-to",
            DiagnosticKind::CannotFindName => "cannot-find-name",
            DiagnosticKind::AlreadyDeclared => "already-declared",
            DiagnosticKind::Misc => "misc",
            DiagnosticKind::CannotFindModule => "cannot-find-module",
            DiagnosticKind::CannotFindExport => "cannot-find-export",
        };
        f.write_str(code)
    }
}

//! Shared infrastructure for the Bagel compiler: source spans, the salsa
//! database and the diagnostic accumulator every phase reports into.
pub mod database;
pub mod diagnostic;
pub mod span;

pub use database::{BagelDatabaseImpl, DatabaseError, Db, SourceFile};
pub use diagnostic::{CompilationPhase, Diagnostic, DiagnosticKind, DiagnosticSeverity};
pub use span::Span;

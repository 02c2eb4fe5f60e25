//! Compilation pipeline for Bagel.
//!
//! The stages are Salsa tracked functions, so each is cached per file and
//! re-runs only when its inputs change.
//!
//! ```text
//! SourceFile
//!     │
//!     ▼
//! parse_module ─► Module (arena AST, or empty on a syntax error)
//!     │
//!     ▼
//! check_file ─► diagnostics (accumulated)
//! ```
//!
//! The checker itself is salsa-free. The queries here hand it a
//! [`DbLoader`], so an import is just another `parse_module` call and
//! becomes a dependency of the importing file's check.
//!
//! ## Diagnostics
//!
//! Every stage reports through the [`Diagnostic`] accumulator. A file's
//! diagnostics include syntax errors of the modules it imports, each
//! carrying its own path.

use std::sync::Arc;

use bagel_ast::{Module, NodeId, parse_module};
use bagel_check::{BagelError, ModuleLoader, Type};
use bagel_core::database::import_path;
use bagel_core::{CompilationPhase, Db, Diagnostic, DiagnosticSeverity, SourceFile};
use salsa::Accumulator;

/// Resolves import specifiers to parsed modules through the database.
pub struct DbLoader<'db> {
    db: &'db dyn Db,
}

impl<'db> DbLoader<'db> {
    pub fn new(db: &'db dyn Db) -> Self {
        Self { db }
    }
}

impl ModuleLoader for DbLoader<'_> {
    fn get_module_by_name(&self, from: &Module, path: &str) -> Option<Arc<Module>> {
        match self.db.input(import_path(from.path(), path)) {
            Ok(file) => Some(parse_module(self.db, file)),
            Err(err) => {
                tracing::debug!(%err, "import not loaded");
                None
            }
        }
    }
}

/// Typecheck one file, accumulating a [`Diagnostic`] per error.
#[salsa::tracked]
pub fn check_file(db: &dyn Db, file: SourceFile) {
    let module = parse_module(db, file);
    let loader = DbLoader::new(db);
    bagel_check::typecheck(&loader, &module, &mut |error| {
        to_diagnostic(&module, &error).accumulate(db);
    });
}

/// The inferred type of one node of a file, with generics preserved.
///
/// Memoized per `(file, node)`; an id that is not part of the file's
/// current tree is `unknown`.
#[salsa::tracked]
pub fn node_type(db: &dyn Db, file: SourceFile, node: NodeId) -> Type {
    let module = parse_module(db, file);
    if !module.contains(node) {
        return Type::Unknown;
    }
    bagel_check::infer_type(&DbLoader::new(db), &module.node(node), true)
}

/// Run the pipeline on `file` and collect every diagnostic it produced,
/// in source order.
pub fn check_with_diagnostics(db: &dyn Db, file: SourceFile) -> Vec<Diagnostic> {
    check_file(db, file);
    check_file::accumulated::<Diagnostic>(db, file)
        .into_iter()
        .cloned()
        .collect()
}

fn to_diagnostic(module: &Module, error: &BagelError) -> Diagnostic {
    Diagnostic {
        path: module.path().to_path_buf(),
        message: error.to_string(),
        span: error.node().span(),
        kind: error.kind(),
        severity: DiagnosticSeverity::Error,
        phase: CompilationPhase::TypeChecking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bagel_core::{BagelDatabaseImpl, DiagnosticKind, Span};

    #[test]
    fn test_diagnostic_points_at_value() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/main.bgl", "const x: number = 'foo'");
        let diagnostics = check_with_diagnostics(&db, file);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::AssignableTo);
        assert_eq!(diagnostics[0].span, Span::new(18, 23));
        assert_eq!(diagnostics[0].phase, CompilationPhase::TypeChecking);
    }

    #[test]
    fn test_syntax_error_is_only_diagnostic() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/main.bgl", "const = 1");
        let diagnostics = check_with_diagnostics(&db, file);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
    }

    #[test]
    fn test_node_type_of_foreign_id_is_unknown() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/main.bgl", "const a = 1");
        assert_eq!(node_type(&db, file, NodeId::from_raw(10_000)), Type::Unknown);
    }
}

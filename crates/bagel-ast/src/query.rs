//! Salsa-tracked parsing.

use std::sync::Arc;

use bagel_core::{CompilationPhase, Diagnostic, DiagnosticKind, DiagnosticSeverity, SourceFile};
use salsa::Accumulator;

use crate::{Module, parse};

/// Parse a source file to an AST module.
///
/// A file with a syntax error reports one `syntax` diagnostic and yields an
/// empty module, so that importers and the checker see no declarations
/// instead of a half-built tree.
#[salsa::tracked]
pub fn parse_module(db: &dyn salsa::Database, file: SourceFile) -> Arc<Module> {
    let path = file.path(db);
    match parse(path.clone(), file.text(db)) {
        Ok(module) => {
            tracing::debug!(path = %path.display(), nodes = module.len(), "parsed module");
            Arc::new(module)
        }
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "syntax error");
            Diagnostic {
                path: path.clone(),
                message: error.message,
                span: error.span,
                kind: DiagnosticKind::Syntax,
                severity: DiagnosticSeverity::Error,
                phase: CompilationPhase::Parsing,
            }
            .accumulate(db);
            Arc::new(Module::empty(path.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bagel_core::{BagelDatabaseImpl, Span};

    #[test]
    fn test_parse_module_is_memoized() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/a.bgl", "const a = 1");
        let first = parse_module(&db, file);
        let second = parse_module(&db, file);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.declarations().len(), 1);
    }

    #[test]
    fn test_syntax_error_is_accumulated() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/a.bgl", "const = 1");
        let module = parse_module(&db, file);
        assert!(module.declarations().is_empty());

        let diagnostics: Vec<Diagnostic> = parse_module::accumulated::<Diagnostic>(&db, file)
            .into_iter()
            .cloned()
            .collect();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::Syntax);
        assert_eq!(diagnostics[0].span, Span::new(6, 7));
        assert_eq!(
            diagnostics[0].message,
            "expected an identifier, found `=`"
        );
    }

    #[test]
    fn test_reparse_after_edit() {
        let mut db = BagelDatabaseImpl::default();
        let file = db.set_source("/a.bgl", "const a = 1");
        assert_eq!(parse_module(&db, file).declarations().len(), 1);
        db.set_source("/a.bgl", "const a = 1\nconst b = 2");
        assert_eq!(parse_module(&db, file).declarations().len(), 2);
    }
}

//! Diagnostic formatting for the Bagel CLI.

use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use bagel_core::{Diagnostic, DiagnosticKind, DiagnosticSeverity};

/// Get the display color for a diagnostic kind.
pub fn kind_color(kind: DiagnosticKind) -> Color {
    match kind {
        DiagnosticKind::Syntax => Color::Red,
        DiagnosticKind::AssignableTo => Color::Magenta,
        DiagnosticKind::CannotFindName | DiagnosticKind::AlreadyDeclared => Color::Yellow,
        DiagnosticKind::CannotFindModule | DiagnosticKind::CannotFindExport => Color::Cyan,
        DiagnosticKind::Misc => Color::Blue,
    }
}

/// Normalize a span to ensure end > start (required by ariadne).
pub fn normalize_span(start: usize, end: usize) -> (usize, usize) {
    (start, end.max(start + 1))
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |newline| before[newline + 1..].chars().count())
        + 1;
    (line, column)
}

/// One line per diagnostic: `path:line:col: kind: message`.
pub fn render_short(diag: &Diagnostic, source: &str) -> String {
    let (line, column) = line_col(source, diag.span.start);
    format!(
        "{}:{line}:{column}: {}: {}",
        diag.path.display(),
        diag.kind,
        diag.message
    )
}

/// A full ariadne report with the offending source underlined.
pub fn render_human(diag: &Diagnostic, source: &str, color: bool) -> String {
    let path = diag.path.display().to_string();
    let (start, end) = normalize_span(diag.span.start, diag.span.end);
    let kind = match diag.severity {
        DiagnosticSeverity::Error => ReportKind::Error,
        DiagnosticSeverity::Warning => ReportKind::Warning,
        DiagnosticSeverity::Info => ReportKind::Advice,
    };

    let mut out = Vec::new();
    Report::build(kind, (path.as_str(), start..end))
        .with_config(
            Config::default()
                .with_color(color)
                .with_index_type(IndexType::Byte),
        )
        .with_code(diag.kind)
        .with_message(&diag.message)
        .with_label(
            Label::new((path.as_str(), start..end))
                .with_message(&diag.message)
                .with_color(kind_color(diag.kind)),
        )
        .finish()
        .write((path.as_str(), Source::from(source)), &mut out)
        .ok();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bagel_core::{CompilationPhase, Span};

    fn diagnostic(span: Span) -> Diagnostic {
        Diagnostic {
            path: "/src/main.bgl".into(),
            message: "Couldn't find name 'b'".into(),
            span,
            kind: DiagnosticKind::CannotFindName,
            severity: DiagnosticSeverity::Error,
            phase: CompilationPhase::TypeChecking,
        }
    }

    #[test]
    fn test_normalize_span_zero_length() {
        assert_eq!(normalize_span(0, 10), (0, 10));
        assert_eq!(normalize_span(5, 5), (5, 6));
    }

    #[test]
    fn test_line_col() {
        let source = "const a = 1\nconst c = b";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 6), (1, 7));
        assert_eq!(line_col(source, 22), (2, 11));
        assert_eq!(line_col(source, 999), (2, 12));
    }

    #[test]
    fn test_render_short() {
        let source = "const a = 1\nconst c = b";
        assert_eq!(
            render_short(&diagnostic(Span::new(22, 23)), source),
            "/src/main.bgl:2:11: cannot-find-name: Couldn't find name 'b'"
        );
    }

    #[test]
    fn test_render_human_mentions_code_and_message() {
        let source = "const a = 1\nconst c = b";
        let report = render_human(&diagnostic(Span::new(22, 23)), source, false);
        assert!(report.contains("cannot-find-name"));
        assert!(report.contains("Couldn't find name 'b'"));
        assert!(report.contains("/src/main.bgl:2:11"));
    }
}

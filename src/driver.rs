//! The `check` command: load files, run the pipeline and print diagnostics.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;

use bagel_core::{BagelDatabaseImpl, Db, Diagnostic};

use crate::diagnostics::{render_human, render_short};
use crate::pipeline::check_with_diagnostics;

/// How diagnostics are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Annotated source snippets.
    #[default]
    Human,
    /// One `path:line:col: kind: message` line per diagnostic.
    Short,
}

/// Outcome of checking a set of files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub files: usize,
    pub errors: usize,
}

/// Check every file in `paths`, writing diagnostics to `out`.
///
/// A diagnostic reached through more than one file (a syntax error in a
/// shared import) is printed once. Unreadable files count as errors.
pub fn check_paths(
    db: &BagelDatabaseImpl,
    paths: &[PathBuf],
    format: OutputFormat,
    color: bool,
    out: &mut dyn Write,
) -> io::Result<CheckSummary> {
    let mut summary = CheckSummary::default();
    let mut seen: HashSet<Diagnostic> = HashSet::new();

    for path in paths {
        let file = match db.input(path.clone()) {
            Ok(file) => file,
            Err(err) => {
                writeln!(out, "error: {err}")?;
                summary.errors += 1;
                continue;
            }
        };
        summary.files += 1;

        let diagnostics = check_with_diagnostics(db, file);
        tracing::debug!(path = %path.display(), count = diagnostics.len(), "checked file");
        for diag in diagnostics {
            if !seen.insert(diag.clone()) {
                continue;
            }
            if diag.is_error() {
                summary.errors += 1;
            }
            let source = match db.input(diag.path.clone()) {
                Ok(owner) => owner.text(db).clone(),
                Err(_) => String::new(),
            };
            match format {
                OutputFormat::Human => write!(out, "{}", render_human(&diag, &source, color))?,
                OutputFormat::Short => writeln!(out, "{}", render_short(&diag, &source))?,
            }
        }
    }
    Ok(summary)
}

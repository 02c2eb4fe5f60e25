//! The `check` driver over files on disk.

use std::fs;
use std::path::PathBuf;

use bagel::BagelDatabaseImpl;
use bagel::driver::{CheckSummary, OutputFormat, check_paths};
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, text) in files {
        fs::write(dir.path().join(name), text).unwrap();
    }
    dir
}

fn run(paths: &[PathBuf], format: OutputFormat) -> (CheckSummary, String) {
    let db = BagelDatabaseImpl::default();
    let mut out = Vec::new();
    let summary = check_paths(&db, paths, format, false, &mut out).unwrap();
    (summary, String::from_utf8(out).unwrap())
}

#[test]
fn test_clean_project() {
    let dir = project(&[
        ("lib.bgl", "export func double(n: number): number => n * 2"),
        ("main.bgl", "import { double } from './lib'\nconst x: number = double(2)"),
    ]);
    let (summary, out) = run(&[dir.path().join("main.bgl")], OutputFormat::Short);
    assert_eq!(summary, CheckSummary { files: 1, errors: 0 });
    assert_eq!(out, "");
}

#[test]
fn test_short_format_lists_errors() {
    let dir = project(&[
        ("lib.bgl", "export func double(n: number): number => n * 2"),
        ("main.bgl", "import { double } from './lib'\nconst x: string = double(2)"),
    ]);
    let (summary, out) = run(&[dir.path().join("main.bgl")], OutputFormat::Short);
    assert_eq!(summary, CheckSummary { files: 1, errors: 1 });
    assert!(
        out.trim_end()
            .ends_with("main.bgl:2:19: assignable-to: Type 'number' is not assignable to type 'string'"),
        "{out}"
    );
}

#[test]
fn test_human_format() {
    let dir = project(&[("main.bgl", "const a = b")]);
    let (summary, out) = run(&[dir.path().join("main.bgl")], OutputFormat::Human);
    assert_eq!(summary.errors, 1);
    assert!(out.contains("cannot-find-name"), "{out}");
    assert!(out.contains("Couldn't find name 'b'"), "{out}");
}

#[test]
fn test_shared_import_error_reported_once() {
    let dir = project(&[
        ("lib.bgl", "export const = 1"),
        ("a.bgl", "import './lib' as lib"),
        ("b.bgl", "import './lib' as lib"),
    ]);
    let paths = [dir.path().join("a.bgl"), dir.path().join("b.bgl")];
    let (summary, out) = run(&paths, OutputFormat::Short);
    assert_eq!(summary, CheckSummary { files: 2, errors: 1 });
    assert_eq!(out.matches("syntax").count(), 1, "{out}");
}

#[test]
fn test_unreadable_file() {
    let dir = project(&[]);
    let (summary, out) = run(&[dir.path().join("missing.bgl")], OutputFormat::Short);
    assert_eq!(summary, CheckSummary { files: 0, errors: 1 });
    assert!(out.starts_with("error: cannot read"), "{out}");
}

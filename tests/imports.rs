//! Checking across modules, and re-checking after edits.

use bagel::Db as _;
use bagel::diagnostics::render_short;
use bagel::{BagelDatabaseImpl, Type, check_with_diagnostics, node_type, parse_module};
use insta::assert_snapshot;

const LIB: &str = "\
export const greeting = 'hi'
export type Name = string
export func shout(s: string): string => s + '!'
const hidden = 1";

const MAIN: &str = "\
import { greeting, Name, shout } from './lib'
const n: Name = shout(greeting)";

fn render(db: &BagelDatabaseImpl, path: &str, source: &str) -> String {
    let file = db.input(path.into()).unwrap();
    check_with_diagnostics(db, file)
        .iter()
        .map(|diag| render_short(diag, source))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_imported_names_check_cleanly() {
    let mut db = BagelDatabaseImpl::default();
    db.set_source("/app/lib.bgl", LIB);
    db.set_source("/app/main.bgl", MAIN);
    assert_snapshot!(render(&db, "/app/main.bgl", MAIN), @"");
}

#[test]
fn test_edit_in_import_is_seen_by_importer() {
    let mut db = BagelDatabaseImpl::default();
    db.set_source("/app/lib.bgl", LIB);
    db.set_source("/app/main.bgl", MAIN);
    assert_snapshot!(render(&db, "/app/main.bgl", MAIN), @"");

    db.set_source("/app/lib.bgl", LIB.replace("'hi'", "1"));
    assert_snapshot!(
        render(&db, "/app/main.bgl", MAIN),
        @"/app/main.bgl:2:23: assignable-to: Type '1' is not assignable to type 'string'"
    );
}

#[test]
fn test_missing_module_and_export() {
    let mut db = BagelDatabaseImpl::default();
    db.set_source("/app/lib.bgl", LIB);
    let main = "import { hidden } from './lib'\nimport './nope' as nope";
    db.set_source("/app/main.bgl", main);
    assert_snapshot!(render(&db, "/app/main.bgl", main), @r"
    /app/main.bgl:1:10: cannot-find-export: Module './lib' has no exported member named 'hidden'
    /app/main.bgl:2:1: cannot-find-module: Couldn't find module './nope'
    ");
}

#[test]
fn test_module_alias_and_parent_directory() {
    let mut db = BagelDatabaseImpl::default();
    db.set_source("/lib/strings.bgl", LIB);
    let main = "import '../lib/strings' as strings\nconst g: string = strings.greeting";
    db.set_source("/app/main.bgl", main);
    assert_snapshot!(render(&db, "/app/main.bgl", main), @"");
}

#[test]
fn test_syntax_error_in_import() {
    let mut db = BagelDatabaseImpl::default();
    db.set_source("/app/lib.bgl", "export const = 1");
    let main = "import { a } from './lib'";
    db.set_source("/app/main.bgl", main);
    let file = db.input("/app/main.bgl".into()).unwrap();

    let mut found: Vec<String> = check_with_diagnostics(&db, file)
        .iter()
        .map(|diag| format!("{} {}", diag.path.display(), diag.kind))
        .collect();
    found.sort();
    assert_eq!(
        found,
        ["/app/lib.bgl syntax", "/app/main.bgl cannot-find-export"]
    );
}

#[test]
fn test_node_type_follows_edits() {
    let mut db = BagelDatabaseImpl::default();
    let file = db.set_source("/app/main.bgl", "const a = 1");
    let a = parse_module(&db, file).declarations()[0].id();
    assert_eq!(node_type(&db, file, a), Type::number_literal(1.0));
    assert_eq!(node_type(&db, file, a), Type::number_literal(1.0));

    db.set_source("/app/main.bgl", "const a = 'x'");
    assert_eq!(node_type(&db, file, a), Type::string_literal("x"));
}

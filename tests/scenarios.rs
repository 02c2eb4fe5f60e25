//! End-to-end checks of single modules through the salsa pipeline.

use bagel::diagnostics::render_short;
use bagel::{BagelDatabaseImpl, Type, check_with_diagnostics, node_type, parse_module};
use insta::assert_snapshot;

fn check(source: &str) -> String {
    let mut db = BagelDatabaseImpl::default();
    let file = db.set_source("/main.bgl", source);
    check_with_diagnostics(&db, file)
        .iter()
        .map(|diag| render_short(diag, source))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_annotation_mismatch() {
    assert_snapshot!(
        check("const x: number = 'foo'"),
        @"/main.bgl:1:19: assignable-to: Type ''foo'' is not assignable to type 'number'"
    );
}

#[test]
fn test_ordered_constants() {
    let source = "const b = 12\nconst a = b + 2";
    assert_snapshot!(check(source), @"");

    let mut db = BagelDatabaseImpl::default();
    let file = db.set_source("/main.bgl", source);
    let a = parse_module(&db, file).declarations()[1].id();
    assert_eq!(node_type(&db, file, a), Type::Number);
}

#[test]
fn test_forward_reference() {
    assert_snapshot!(
        check("const a = b + 2\nconst b = 12"),
        @"/main.bgl:1:11: misc: 'b' is used before it is initialized"
    );
}

#[test]
fn test_explicit_type_argument() {
    assert_snapshot!(
        check("func other<T>(a: T): T => a\nconst x = other<number>('foo')"),
        @"/main.bgl:2:25: assignable-to: Type ''foo'' is not assignable to type 'number'"
    );
}

#[test]
fn test_optional_chaining() {
    assert_snapshot!(
        check("type Obj = { foo: nil | { bar: number } }\nfunc fn(o: Obj): number | nil => o.foo?.bar"),
        @""
    );
    assert_snapshot!(
        check("type Obj = { foo: nil | { bar: number } }\nfunc fn(o: Obj): number | nil => o.foo.bar"),
        @"/main.bgl:2:34: misc: Property 'bar' does not exist on type 'nil | { bar: number }'"
    );
}

#[test]
fn test_duplicate_func() {
    assert_snapshot!(
        check("func foo() => 1\nfunc foo() => 2"),
        @"/main.bgl:2:1: already-declared: 'foo' is already declared in this scope"
    );
}

#[test]
fn test_every_error_is_reported() {
    let source = "\
const a: string = 1
proc p(n: number) {
    if n { }
    for x of n { }
    const c = 1;
    c = 2
}
const d = missing";
    assert_snapshot!(check(source), @r"
    /main.bgl:1:19: assignable-to: Type '1' is not assignable to type 'string'
    /main.bgl:3:8: misc: Condition must be a boolean, but has type 'number'
    /main.bgl:4:14: misc: Expected an iterator, but found type 'number'
    /main.bgl:6:5: misc: Cannot assign to 'c' because it is not mutable
    /main.bgl:8:11: cannot-find-name: Couldn't find name 'missing'
    ");
}

#[test]
fn test_syntax_error() {
    assert_snapshot!(
        check("const = 1"),
        @"/main.bgl:1:7: syntax: expected an identifier, found `=`"
    );
}

//! The checking pass: one walk over a module, collecting every diagnostic.
//!
//! Children are checked before their parent so that a node knows whether
//! anything below it already failed. Rules comparing an `unknown` type that
//! came out of such a failure are skipped, so one fault yields one
//! diagnostic. Output is still in pre-order.

use std::sync::Arc;

use bagel_ast::{Access, BinaryOp, Module, Node, NodeId, NodeKind, UnaryOp};

use crate::analyzer::Analyzer;
use crate::binding::{Binding, Namespace, ResolveError};
use crate::error::{BagelError, Problem};
use crate::infer::{Call, enclosing_store, erase_generics, signature, store_member};
use crate::types::{FuncArg, Type, TypeParam};

impl Analyzer<'_> {
    /// Check `module`, passing each diagnostic to `report` in source order.
    pub fn typecheck(&self, module: &Arc<Module>, report: &mut dyn FnMut(BagelError)) {
        let errors = self.check_node(&module.root_node());
        tracing::debug!(
            path = %module.path().display(),
            errors = errors.len(),
            "module checked"
        );
        for error in errors {
            report(error);
        }
    }

    fn check_node(&self, node: &Node) -> Vec<BagelError> {
        let below: Vec<BagelError> = node
            .children()
            .iter()
            .flat_map(|child| self.check_node(child))
            .collect();
        let mut out = Vec::new();
        self.check_rules(node, !below.is_empty(), &mut out);
        out.extend(below);
        out
    }

    fn check_rules(&self, node: &Node, faulty: bool, out: &mut Vec<BagelError>) {
        let child = |id: &NodeId| node.child(*id);
        match node.kind() {
            NodeKind::Module { .. } => {
                let binders = node
                    .children()
                    .iter()
                    .flat_map(|decl| self.module_binders(decl))
                    .collect();
                report_duplicates(binders, out);
            }
            NodeKind::ImportDeclaration { path, items } => {
                match self.load(node, path) {
                    None => out.push(BagelError::CannotFindModule {
                        node: node.clone(),
                        path: path.clone(),
                    }),
                    Some(target) => {
                        for item in items.iter().map(child) {
                            let NodeKind::ImportItem { name, .. } = item.kind() else {
                                continue;
                            };
                            let exported = [Namespace::Value, Namespace::Type]
                                .into_iter()
                                .any(|ns| self.find_export(&target, name, ns).is_some());
                            if !exported {
                                out.push(BagelError::CannotFindExport {
                                    node: item.clone(),
                                    path: path.clone(),
                                    name: name.clone(),
                                });
                            }
                        }
                    }
                }
            }
            NodeKind::ImportAllDeclaration { path, .. } => {
                if self.load(node, path).is_none() {
                    out.push(BagelError::CannotFindModule {
                        node: node.clone(),
                        path: path.clone(),
                    });
                }
            }
            NodeKind::TypeDeclaration { type_params, .. }
            | NodeKind::FuncType { type_params, .. }
            | NodeKind::ProcType { type_params, .. } => {
                report_duplicates(type_param_binders(node, type_params), out);
            }
            NodeKind::StoreDeclaration { members, .. } => {
                let binders = members
                    .iter()
                    .map(child)
                    .filter_map(|member| match member.kind() {
                        NodeKind::StoreMember { name, .. } => {
                            Some((name.clone(), Namespace::Value, member.clone()))
                        }
                        _ => None,
                    })
                    .collect();
                report_duplicates(binders, out);
            }
            NodeKind::StoreMember {
                type_annotation: Some(t),
                value,
                ..
            }
            | NodeKind::ValueDeclaration {
                type_annotation: Some(t),
                value,
                ..
            }
            | NodeKind::DeclarationStatement {
                type_annotation: Some(t),
                value,
                ..
            } => {
                let expected = self.lower(&child(t));
                let value = child(value);
                let actual = self.infer(&value, false);
                self.expect_assignable(out, faulty, &value, expected, actual);
            }
            NodeKind::InlineConst {
                type_annotation,
                value,
                ..
            } => {
                if let Some(t) = type_annotation {
                    let expected = self.lower(&child(t));
                    let value = child(value);
                    let actual = self.infer(&value, false);
                    self.expect_assignable(out, faulty, &value, expected, actual);
                }
            }
            NodeKind::Func {
                type_params,
                params,
                return_type,
                body,
            } => {
                self.check_signature(node, type_params, params, out);
                if let Some(t) = return_type {
                    let expected = self.lower(&child(t));
                    let body = child(body);
                    let actual = self.infer(&body, false);
                    self.expect_assignable(out, faulty, &body, expected, actual);
                }
            }
            NodeKind::Proc {
                type_params,
                params,
                ..
            } => self.check_signature(node, type_params, params, out),
            NodeKind::Block(statements) => {
                let binders = statements
                    .iter()
                    .map(child)
                    .filter_map(|statement| match statement.kind() {
                        NodeKind::DeclarationStatement { name, .. } => {
                            Some((name.clone(), Namespace::Value, statement.clone()))
                        }
                        _ => None,
                    })
                    .collect();
                report_duplicates(binders, out);
            }
            NodeKind::LocalIdentifier(name) => match self.resolve(name, node) {
                Err(ResolveError::CannotFindName) => out.push(BagelError::CannotFindName {
                    node: node.clone(),
                    name: name.clone(),
                }),
                Err(ResolveError::UsedBeforeInitialization(_)) => out.push(BagelError::misc(
                    node,
                    Problem::UsedBeforeInitialization(name.clone()),
                )),
                Err(ResolveError::UsedInOwnInitializer(_)) => out.push(BagelError::misc(
                    node,
                    Problem::UsedInOwnInitializer(name.clone()),
                )),
                // reported once, at the import
                Err(ResolveError::CannotFindModule { .. } | ResolveError::CannotFindExport { .. }) => {}
                Ok(_) => {}
            },
            NodeKind::NamedType { name, type_args } => {
                match self.resolve_in(name, node, Namespace::Type) {
                    Err(ResolveError::CannotFindName) => out.push(BagelError::CannotFindName {
                        node: node.clone(),
                        name: name.clone(),
                    }),
                    Ok(Binding::Type { params, .. }) if params.len() != type_args.len() => {
                        out.push(BagelError::misc(
                            node,
                            Problem::TypeArgumentCount {
                                expected: params.len(),
                                found: type_args.len(),
                            },
                        ))
                    }
                    _ => {}
                }
            }
            NodeKind::Invocation { .. } | NodeKind::Pipe { .. } => {
                if let Some(call) = self.call(node) {
                    self.check_call(node, &call, faulty, out);
                }
            }
            NodeKind::ExpressionStatement(inner) => {
                let inner = child(inner);
                if let Some(call) = self.call(&inner) {
                    if matches!(call.subject, Type::Func { .. }) {
                        out.push(BagelError::misc(&inner, Problem::FuncAsStatement));
                    }
                }
            }
            NodeKind::IfElseCase { condition, .. } | NodeKind::WhileLoop { condition, .. } => {
                self.expect_boolean(out, faulty, &child(condition));
            }
            NodeKind::TestExprDeclaration { expr, .. } => {
                self.expect_boolean(out, faulty, &child(expr));
            }
            NodeKind::UnaryOperation { op, operand } => {
                let operand = self.infer(&child(operand), true);
                if faulty && operand.is_unknown() {
                    return;
                }
                let required = match op {
                    UnaryOp::Not => Type::Boolean,
                    UnaryOp::Negate => Type::Number,
                };
                if !self.subsumes(&required, &operand, true) {
                    out.push(BagelError::misc(
                        node,
                        Problem::UnaryOperatorMismatch { op: *op, operand },
                    ));
                }
            }
            NodeKind::BinaryOperation { left, op, right } => {
                if *op == BinaryOp::NullishCoalescing {
                    return;
                }
                let left = self.infer(&child(left), true);
                let right = self.infer(&child(right), true);
                if faulty && (left.is_unknown() || right.is_unknown()) {
                    return;
                }
                if self.binary_result(*op, &left, &right).is_none() {
                    out.push(BagelError::misc(
                        node,
                        Problem::OperatorMismatch {
                            op: *op,
                            left,
                            right,
                        },
                    ));
                }
            }
            NodeKind::PropertyAccessor {
                subject,
                property,
                optional,
            } => self.check_property(node, &child(subject), property, *optional, faulty, out),
            NodeKind::IndexerAccess {
                subject,
                index,
                optional,
            } => {
                let base = self.expand(&self.infer(&child(subject), true));
                let index = self.infer(&child(index), true);
                if faulty && (base.is_unknown() || index.is_unknown()) {
                    return;
                }
                let base = if *optional {
                    self.subtract(&base, &Type::Nil)
                } else {
                    base
                };
                if self.index_type(&base, &index).is_none() {
                    out.push(BagelError::misc(node, Problem::InvalidIndexer { base, index }));
                }
            }
            NodeKind::Assignment { target, value } => {
                let target = child(target);
                let reported = out.len();
                self.check_assignment_target(&target, out);
                if out.len() > reported {
                    return;
                }
                let value = child(value);
                let expected = self.infer(&target, true);
                let actual = self.infer(&value, false);
                self.expect_assignable(out, faulty, &value, expected, actual);
            }
            NodeKind::ForLoop { iterator, .. } => {
                let iterator = child(iterator);
                let ty = self.expand(&self.infer(&iterator, true));
                if faulty && ty.is_unknown() {
                    return;
                }
                if !matches!(ty, Type::Iterator(_) | Type::Any | Type::Escape) {
                    out.push(BagelError::misc(&iterator, Problem::NotIterable(ty)));
                }
            }
            NodeKind::SwitchExpression { value, cases, .. } => {
                let subject = self.infer(&child(value), true);
                for case in cases.iter().map(child) {
                    if let NodeKind::SwitchCase { test, .. } = case.kind() {
                        let test = case.child(*test);
                        let actual = self.infer(&test, false);
                        self.expect_assignable(out, faulty, &test, subject.clone(), actual);
                    }
                }
            }
            NodeKind::AsCast { inner, type_expr } => {
                let expected = self.lower(&child(type_expr));
                let inner = child(inner);
                let actual = self.infer(&inner, false);
                self.expect_assignable(out, faulty, &inner, expected, actual);
            }
            NodeKind::This => {
                if enclosing_store(node).is_none() {
                    out.push(BagelError::misc(node, Problem::ThisOutsideStore));
                }
            }
            _ => {}
        }
    }

    /// Binders a top-level declaration contributes to the module scope.
    fn module_binders(&self, decl: &Node) -> Vec<(String, Namespace, Node)> {
        let both = |name: &String| {
            vec![
                (name.clone(), Namespace::Value, decl.clone()),
                (name.clone(), Namespace::Type, decl.clone()),
            ]
        };
        match decl.kind() {
            NodeKind::ImportDeclaration { path, items } => {
                let target = self.load(decl, path);
                items
                    .iter()
                    .map(|id| decl.child(*id))
                    .flat_map(|item| {
                        let NodeKind::ImportItem { name, alias } = item.kind() else {
                            return Vec::new();
                        };
                        let local = alias.as_ref().unwrap_or(name);
                        let mut namespaces: Vec<Namespace> = [Namespace::Value, Namespace::Type]
                            .into_iter()
                            .filter(|ns| {
                                target
                                    .as_ref()
                                    .is_some_and(|target| self.find_export(target, name, *ns).is_some())
                            })
                            .collect();
                        if namespaces.is_empty() {
                            namespaces.push(Namespace::Value);
                        }
                        namespaces
                            .into_iter()
                            .map(|ns| (local.clone(), ns, item.clone()))
                            .collect()
                    })
                    .collect()
            }
            NodeKind::ImportAllDeclaration { alias, .. } => {
                vec![(alias.clone(), Namespace::Value, decl.clone())]
            }
            NodeKind::TypeDeclaration {
                name,
                nominal: true,
                ..
            }
            | NodeKind::StoreDeclaration { name, .. } => both(name),
            NodeKind::TypeDeclaration { name, .. } => {
                vec![(name.clone(), Namespace::Type, decl.clone())]
            }
            NodeKind::FuncDeclaration { name, .. }
            | NodeKind::ProcDeclaration { name, .. }
            | NodeKind::ValueDeclaration { name, .. } => {
                vec![(name.clone(), Namespace::Value, decl.clone())]
            }
            _ => Vec::new(),
        }
    }

    fn check_signature(
        &self,
        node: &Node,
        type_params: &[NodeId],
        params: &[NodeId],
        out: &mut Vec<BagelError>,
    ) {
        let mut binders = type_param_binders(node, type_params);
        binders.extend(params.iter().filter_map(|id| {
            let param = node.child(*id);
            match param.kind() {
                NodeKind::Param { name, .. } => Some((name.clone(), Namespace::Value, param.clone())),
                _ => None,
            }
        }));
        report_duplicates(binders, out);
    }

    fn check_call(&self, node: &Node, call: &Call, faulty: bool, out: &mut Vec<BagelError>) {
        match &call.subject {
            Type::Any | Type::Escape => return,
            Type::Unknown if faulty => return,
            Type::Proc { .. } => {
                let statement = node
                    .parent()
                    .is_some_and(|parent| matches!(parent.kind(), NodeKind::ExpressionStatement(_)));
                if !statement {
                    out.push(BagelError::misc(node, Problem::ProcInExpression));
                }
            }
            Type::Func { .. } => {}
            other => {
                out.push(BagelError::misc(&call.callee, Problem::NotCallable(other.clone())));
                return;
            }
        }
        let Some((type_params, params)) = signature(&call.subject) else {
            return;
        };

        if !call.type_args.is_empty() {
            if call.type_args.len() != type_params.len() {
                out.push(BagelError::misc(
                    node,
                    Problem::TypeArgumentCount {
                        expected: type_params.len(),
                        found: call.type_args.len(),
                    },
                ));
                return;
            }
            self.check_type_arguments(call, type_params, out);
        }

        if call.args.len() != params.len() {
            out.push(BagelError::misc(
                node,
                Problem::ArityMismatch {
                    expected: params.len(),
                    found: call.args.len(),
                },
            ));
            return;
        }

        let bindings = self.bind_generics(call, type_params, params, true);
        for (index, (param, arg)) in params.iter().zip(&call.args).enumerate() {
            let FuncArg { ty: Some(ty), .. } = param else {
                continue;
            };
            let expected = ty.substitute(&bindings);
            let actual = erase_generics(self.call_arg_type(call, index));
            self.expect_assignable(out, faulty, arg, expected, actual);
        }
    }

    fn check_type_arguments(&self, call: &Call, type_params: &[TypeParam], out: &mut Vec<BagelError>) {
        for (param, arg) in type_params.iter().zip(&call.type_args) {
            let Some(extends) = &param.extends else {
                continue;
            };
            let ty = self.lower(arg);
            if !self.subsumes(extends, &ty, false) {
                out.push(BagelError::AssignableTo {
                    node: arg.clone(),
                    destination: extends.clone(),
                    value: ty,
                });
            }
        }
    }

    fn check_property(
        &self,
        node: &Node,
        subject: &Node,
        property: &str,
        optional: bool,
        faulty: bool,
        out: &mut Vec<BagelError>,
    ) {
        let parent = node.parent();
        let method_subject = parent.as_ref().is_some_and(|parent| {
            matches!(parent.kind(), NodeKind::Invocation { subject, .. } if *subject == node.id())
                && self.method_call(parent).is_some()
        });
        if method_subject {
            return;
        }

        let base = self.expand(&self.infer(subject, true));
        if faulty && base.is_unknown() {
            return;
        }
        let base = if optional {
            self.subtract(&base, &Type::Nil)
        } else {
            base
        };
        if self.property_type(&base, property).is_none() {
            out.push(BagelError::misc(
                node,
                Problem::PropertyNotFound {
                    property: property.to_string(),
                    ty: base,
                },
            ));
            return;
        }
        if let Type::Store { declaration, .. } = &base {
            let private = store_member(declaration, property).is_some_and(|member| {
                matches!(member.kind(), NodeKind::StoreMember { access: Access::Private, .. })
            });
            if private && !node.is_descendant_of(declaration) {
                out.push(BagelError::misc(node, Problem::PrivateMember(property.to_string())));
            }
        }
    }

    fn check_assignment_target(&self, target: &Node, out: &mut Vec<BagelError>) {
        match target.kind() {
            NodeKind::LocalIdentifier(name) => match self.resolve(name, target) {
                Ok(Binding::Basic { declaration }) if is_let(&declaration) => {}
                Ok(_) => out.push(BagelError::misc(target, Problem::NotMutable(name.clone()))),
                Err(_) => {}
            },
            NodeKind::PropertyAccessor {
                subject,
                property,
                optional: false,
            } => match self.expand(&self.infer(&target.child(*subject), true)) {
                Type::Readonly(_) => {
                    out.push(BagelError::misc(target, Problem::NotMutable(property.clone())))
                }
                Type::Store { declaration, .. } => {
                    let public = store_member(&declaration, property).is_some_and(|member| {
                        matches!(member.kind(), NodeKind::StoreMember { access: Access::Public, .. })
                    });
                    if !public && !target.is_descendant_of(&declaration) {
                        out.push(BagelError::misc(target, Problem::NotMutable(property.clone())));
                    }
                }
                _ => {}
            },
            NodeKind::IndexerAccess {
                subject,
                optional: false,
                ..
            } => {
                let base = self.expand(&self.infer(&target.child(*subject), true));
                if let Type::Readonly(_) = base {
                    out.push(BagelError::misc(target, Problem::NotMutable(base.to_string())));
                }
            }
            _ => out.push(BagelError::misc(target, Problem::InvalidAssignmentTarget)),
        }
    }

    fn expect_assignable(
        &self,
        out: &mut Vec<BagelError>,
        faulty: bool,
        at: &Node,
        destination: Type,
        value: Type,
    ) {
        if faulty && (destination.is_unknown() || value.is_unknown()) {
            return;
        }
        if !self.subsumes(&destination, &value, false) {
            out.push(BagelError::AssignableTo {
                node: at.clone(),
                destination,
                value,
            });
        }
    }

    fn expect_boolean(&self, out: &mut Vec<BagelError>, faulty: bool, condition: &Node) {
        let ty = self.infer(condition, false);
        if faulty && ty.is_unknown() {
            return;
        }
        if !self.subsumes(&Type::Boolean, &ty, true) {
            out.push(BagelError::misc(condition, Problem::NonBooleanCondition(ty)));
        }
    }
}

fn type_param_binders(holder: &Node, type_params: &[NodeId]) -> Vec<(String, Namespace, Node)> {
    type_params
        .iter()
        .filter_map(|id| {
            let param = holder.child(*id);
            match param.kind() {
                NodeKind::GenericParam { name, .. } => Some((name.clone(), Namespace::Type, param.clone())),
                _ => None,
            }
        })
        .collect()
}

/// One `already-declared` per binder that repeats an earlier name in the
/// same namespace.
fn report_duplicates(binders: Vec<(String, Namespace, Node)>, out: &mut Vec<BagelError>) {
    let mut reported: Vec<&Node> = Vec::new();
    for (i, (name, namespace, node)) in binders.iter().enumerate() {
        let repeated = binders[..i]
            .iter()
            .any(|(earlier, ns, _)| earlier == name && ns == namespace);
        if repeated && !reported.contains(&node) {
            reported.push(node);
            out.push(BagelError::AlreadyDeclared {
                node: node.clone(),
                name: name.clone(),
            });
        }
    }
}

fn is_let(declaration: &Node) -> bool {
    matches!(
        declaration.kind(),
        NodeKind::ValueDeclaration { is_const: false, .. }
            | NodeKind::DeclarationStatement { is_const: false, .. }
    )
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::test_support::{Source, TestLoader, check};

    #[test]
    fn test_assignable_to() {
        assert_eq!(
            check("const x: number = 'foo'"),
            ["assignable-to: Type ''foo'' is not assignable to type 'number'"]
        );
    }

    #[test]
    fn test_literals_flow_into_wider_annotations() {
        assert!(check("const a: number[] = [1, 2]").is_empty());
        assert!(check("let xs: string[] = ['a', 'b']").is_empty());
        assert!(check("const a: number = if true { 1 } else { 2 }").is_empty());
        assert!(check("const o: { n: number, s: string } = { n: 1, s: 'x' }").is_empty());
        assert!(check("func id<T>(xs: T[]): T[] => xs\nconst b = id([1, 2])").is_empty());
        assert_eq!(
            check("const a: number[] = [1, 'x']"),
            ["assignable-to: Type '(1 | 'x')[]' is not assignable to type 'number[]'"]
        );
        assert_eq!(
            check("const a: string = if true { 'a' } else { 2 }"),
            ["assignable-to: Type ''a' | 2' is not assignable to type 'string'"]
        );
    }

    #[test]
    fn test_long_method_chains_check_quickly() {
        let chain = ".map(x => x)".repeat(24);
        let text = format!(
            "func map<T, R>(xs: T[], f: (x: T) => R): R[] => []\nconst ys: number[] = [1, 2]{chain}"
        );
        let started = Instant::now();
        assert!(check(&text).is_empty());
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_ordered_constants_are_clean() {
        assert!(check("const b = 12\nconst a = b + 2").is_empty());
    }

    #[test]
    fn test_used_before_initialization() {
        assert_eq!(
            check("const a = b + 2\nconst b = 12"),
            ["misc: 'b' is used before it is initialized"]
        );
    }

    #[test]
    fn test_self_reference_reports_once() {
        assert_eq!(
            check("const a = a + 1"),
            ["misc: 'a' is referenced in its own initializer"]
        );
    }

    #[test]
    fn test_explicit_type_argument_mismatch() {
        assert_eq!(
            check("func other<T>(a: T): T => a\nconst x = other<number>('foo')"),
            ["assignable-to: Type ''foo'' is not assignable to type 'number'"]
        );
    }

    #[test]
    fn test_optional_chaining() {
        let good = "type Obj = { foo: nil | { bar: number } }\n\
                    func fn(o: Obj): number | nil => o.foo?.bar";
        assert!(check(good).is_empty());

        let bad = "type Obj = { foo: nil | { bar: number } }\n\
                   func fn(o: Obj): number | nil => o.foo.bar";
        assert_eq!(
            check(bad),
            ["misc: Property 'bar' does not exist on type 'nil | { bar: number }'"]
        );
    }

    #[test]
    fn test_duplicate_declarations() {
        assert_eq!(
            check("func foo() => 1\nfunc foo() => 2"),
            ["already-declared: 'foo' is already declared in this scope"]
        );
        assert_eq!(
            check("func f(a: number, a: string) => a\ntype T<U, U> = U"),
            [
                "already-declared: 'a' is already declared in this scope",
                "already-declared: 'U' is already declared in this scope",
            ]
        );
        assert!(check("type A = number\nconst A = 1").is_empty());
    }

    #[test]
    fn test_cannot_find_name() {
        assert_eq!(
            check("const a: Missing = b"),
            [
                "cannot-find-name: Couldn't find name 'Missing'",
                "cannot-find-name: Couldn't find name 'b'",
            ]
        );
    }

    #[test]
    fn test_generic_argument_count() {
        assert_eq!(
            check("type Box<T> = { v: T }\nconst b: Box<number, string> = { v: 1 }"),
            ["misc: Expected 1 type arguments, but got 2"]
        );
    }

    #[test]
    fn test_call_rules() {
        assert_eq!(
            check("func f(a: number) => a\nconst x = f(1, 2)"),
            ["misc: Expected 1 arguments, but got 2"]
        );
        assert_eq!(
            check("const n = 1\nconst x = n(2)"),
            ["misc: Type '1' is not callable"]
        );
        assert_eq!(
            check("func f<T extends string>(a: T) => a\nconst x = f<number>(1)"),
            ["assignable-to: Type 'number' is not assignable to type 'string'"]
        );
        assert_eq!(
            check("func f<T>(a: T) => a\nconst x = f<number, string>(1)"),
            ["misc: Expected 1 type arguments, but got 2"]
        );
    }

    #[test]
    fn test_procs_and_funcs_in_statements() {
        assert_eq!(
            check("proc p() { }\nconst x = p()"),
            ["misc: Procs can't be called in an expression context"]
        );
        assert_eq!(
            check("func f() => 1\nproc p() { f() }"),
            ["misc: Func results must be used; a func call can't be a statement"]
        );
        assert!(check("proc q(n: number) { }\nproc p() { q(1); 2 |> q }").is_empty());
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        assert_eq!(
            check("proc p(n: number) { if n { } while true { } }"),
            ["misc: Condition must be a boolean, but has type 'number'"]
        );
        assert_eq!(
            check("test expr 'adds' => 1 + 1"),
            ["misc: Condition must be a boolean, but has type 'number'"]
        );
        assert!(check("test expr 'adds' => 1 + 1 == 2").is_empty());
    }

    #[test]
    fn test_operator_mismatch() {
        assert_eq!(
            check("const a = true - 1"),
            ["misc: Operator '-' cannot be applied to types 'true' and '1'"]
        );
        assert_eq!(
            check("const a = !'x'"),
            ["misc: Operator '!' cannot be applied to type ''x''"]
        );
    }

    #[test]
    fn test_indexers() {
        assert!(check("func f(a: number[], r: {[string]: number}) => [a[0], r['k']]").is_empty());
        assert_eq!(
            check("func f(a: number[]) => a['x']"),
            ["misc: Type 'number[]' can't be indexed with type ''x''"]
        );
        assert_eq!(
            check("func f(o: { a: number }) => o['b']"),
            ["misc: Type '{ a: number }' can't be indexed with type ''b''"]
        );
    }

    #[test]
    fn test_assignment_targets() {
        assert!(check("proc p() { let a = 1; a = 2 }").is_empty());
        assert_eq!(
            check("proc p() { const a = 1; a = 2 }"),
            ["misc: Cannot assign to 'a' because it is not mutable"]
        );
        assert_eq!(
            check("proc p(o: readonly { a: number }) { o.a = 2 }"),
            ["misc: Cannot assign to 'a' because it is not mutable"]
        );
        assert_eq!(
            check("proc p() { let a = 1; a = 'x' }"),
            ["assignable-to: Type ''x'' is not assignable to type 'number'"]
        );
        assert_eq!(
            check("proc p() { 1 = 2 }"),
            ["misc: Invalid assignment target"]
        );
    }

    #[test]
    fn test_store_access() {
        let text = "store Counter {\n\
                      private secret = 1\n\
                      visible count = 0\n\
                      public proc bump() { this.count = this.count + this.secret }\n\
                    }\n\
                    proc outside() { Counter.count = 5; Counter.bump() }\n\
                    const s = Counter.secret";
        assert_eq!(
            check(text),
            [
                "misc: Cannot assign to 'count' because it is not mutable",
                "misc: Property 'secret' is private to its store",
            ]
        );
    }

    #[test]
    fn test_for_loop_requires_iterator() {
        assert!(check("proc p() { for i of 0..3 { } }").is_empty());
        assert_eq!(
            check("proc p(xs: number[]) { for x of xs { } }"),
            ["misc: Expected an iterator, but found type 'number[]'"]
        );
    }

    #[test]
    fn test_switch_and_cast() {
        assert_eq!(
            check("func f(n: number) => switch n { case 'a': 1, default: 2 }"),
            ["assignable-to: Type ''a'' is not assignable to type 'number'"]
        );
        assert_eq!(
            check("const a = 'x' as number"),
            ["assignable-to: Type ''x'' is not assignable to type 'number'"]
        );
    }

    #[test]
    fn test_this_outside_store() {
        assert_eq!(
            check("const a = this"),
            ["misc: 'this' can only be used inside a store"]
        );
    }

    #[test]
    fn test_callbacks_are_checked_in_context() {
        let text = "func map<T, R>(xs: T[], f: (x: T) => R): R[] => []\n\
                    const ok = map([1, 2], x => x * 2)\n\
                    const bad = map([1, 2], x => x.foo)";
        assert_eq!(
            check(text),
            ["misc: Property 'foo' does not exist on type 'number'"]
        );
    }

    #[test]
    fn test_imports() {
        let mut loader = TestLoader::default();
        loader.add("/lib.bgl", "export const a = 1\nconst hidden = 2\nexport type T = string");
        let source = Source::new(
            "import { a, hidden, T } from './lib'\n\
             import { x } from './missing'\n\
             import './gone' as gone\n\
             const y: T = a",
        );
        assert_eq!(
            source.check(&loader),
            [
                "cannot-find-export: Module './lib' has no exported member named 'hidden'",
                "cannot-find-module: Couldn't find module './missing'",
                "cannot-find-module: Couldn't find module './gone'",
                "assignable-to: Type '1' is not assignable to type 'T'",
            ]
        );
    }

    #[test]
    fn test_diagnostics_are_in_source_order() {
        let text = "const a: number = 'x'\nconst b = c\nconst d: string = 1";
        let kinds: Vec<String> = check(text)
            .into_iter()
            .map(|line| line.split(':').next().unwrap_or_default().to_string())
            .collect();
        assert_eq!(kinds, ["assignable-to", "cannot-find-name", "assignable-to"]);
    }
}

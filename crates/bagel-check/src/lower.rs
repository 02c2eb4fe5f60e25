//! Turning type-expression nodes into [`Type`]s.
//!
//! Lowering is purely syntactic: a named type becomes a lazy
//! [`Type::Named`] reference and is only looked up when [`Analyzer::expand`]
//! needs to see through it. Generic parameters are the one exception, since
//! they must be recognised wherever they appear.

use bagel_ast::{Node, NodeId, NodeKind, Primitive};

use crate::analyzer::{Analyzer, MAX_SUBSUMPTION_DEPTH};
use crate::binding::{Binding, Namespace};
use crate::types::{FuncArg, ObjectEntry, Origin, Type, TypeParam};

impl Analyzer<'_> {
    pub(crate) fn lower(&self, node: &Node) -> Type {
        let lower_child = |id: &NodeId| self.lower(&node.child(*id));
        match node.kind() {
            NodeKind::PrimitiveType(primitive) => match primitive {
                Primitive::String => Type::String,
                Primitive::Number => Type::Number,
                Primitive::Boolean => Type::Boolean,
                Primitive::Nil => Type::Nil,
                Primitive::Unknown => Type::Unknown,
                Primitive::Any => Type::Any,
            },
            NodeKind::LiteralType(value) => Type::Literal(value.clone()),
            NodeKind::NamedType { name, type_args } => match find_generic_param(node, name) {
                Some(param) => self.generic_type(&param),
                None => Type::Named {
                    name: name.clone(),
                    args: type_args.iter().map(lower_child).collect(),
                    origin: Origin(node.clone()),
                },
            },
            NodeKind::UnionType(members) => Type::union(members.iter().map(lower_child)),
            NodeKind::ArrayType(element) => Type::array(lower_child(element)),
            NodeKind::TupleType(elements) => Type::Tuple(elements.iter().map(lower_child).collect()),
            NodeKind::ObjectType(entries) => Type::Object(
                entries
                    .iter()
                    .filter_map(|id| match node.child(*id).kind() {
                        NodeKind::ObjectTypeEntry {
                            name,
                            optional,
                            value,
                        } => Some(ObjectEntry {
                            name: name.clone(),
                            ty: lower_child(value),
                            optional: *optional,
                        }),
                        _ => None,
                    })
                    .collect(),
            ),
            NodeKind::IndexerType { key, value } => Type::Indexer {
                key: Box::new(lower_child(key)),
                value: Box::new(lower_child(value)),
            },
            NodeKind::FuncType {
                type_params,
                params,
                return_type,
            } => Type::Func {
                type_params: self.type_params(node, type_params),
                args: self.declared_args(node, params),
                returns: Box::new(lower_child(return_type)),
            },
            NodeKind::ProcType {
                type_params,
                params,
            } => Type::Proc {
                type_params: self.type_params(node, type_params),
                args: self.declared_args(node, params),
            },
            NodeKind::IteratorType(inner) => Type::Iterator(Box::new(lower_child(inner))),
            NodeKind::PlanType(inner) => Type::Plan(Box::new(lower_child(inner))),
            NodeKind::ReadonlyType(inner) => Type::Readonly(Box::new(lower_child(inner))),
            NodeKind::ParenthesizedType(inner) => lower_child(inner),
            _ => Type::Unknown,
        }
    }

    pub(crate) fn type_params(&self, holder: &Node, ids: &[NodeId]) -> Vec<TypeParam> {
        ids.iter()
            .filter_map(|id| {
                let param = holder.child(*id);
                match self.generic_type(&param) {
                    Type::Generic { name, extends } => Some(TypeParam {
                        name,
                        extends: extends.map(|extends| *extends),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    /// The type a generic parameter declaration stands for inside its scope.
    pub(crate) fn generic_type(&self, param: &Node) -> Type {
        let NodeKind::GenericParam { name, extends } = param.kind() else {
            return Type::Unknown;
        };
        let unconstrained = Type::Generic {
            name: name.clone(),
            extends: None,
        };
        self.guarded(param, unconstrained, || Type::Generic {
            name: name.clone(),
            extends: extends.map(|id| Box::new(self.lower(&param.child(id)))),
        })
    }

    /// Argument list of a signature as written, without contextual typing.
    pub(crate) fn declared_args(&self, holder: &Node, params: &[NodeId]) -> Vec<FuncArg> {
        params
            .iter()
            .filter_map(|id| {
                let param = holder.child(*id);
                match param.kind() {
                    NodeKind::Param {
                        name,
                        type_annotation,
                    } => Some(FuncArg {
                        name: name.clone(),
                        ty: type_annotation.map(|t| self.lower(&param.child(t))),
                    }),
                    _ => None,
                }
            })
            .collect()
    }

    /// See through named type references until the outermost type is
    /// structural. Unresolvable names become `unknown`.
    pub(crate) fn expand(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_SUBSUMPTION_DEPTH {
            let Type::Named { name, args, origin } = &current else {
                return current;
            };
            current = match self.resolve_in(name, &origin.0, Namespace::Type) {
                Ok(Binding::Type { ty, params }) => {
                    let bindings: Vec<_> = params
                        .iter()
                        .enumerate()
                        .map(|(i, param)| {
                            let arg = args.get(i).cloned().unwrap_or_else(|| param.fallback());
                            (param.name.clone(), arg)
                        })
                        .collect();
                    ty.substitute(&bindings)
                }
                _ => Type::Unknown,
            };
        }
        tracing::debug!(%ty, "type alias expansion did not terminate");
        Type::Unknown
    }
}

/// The generic parameter declaration named `name` that is in scope at `node`.
fn find_generic_param(node: &Node, name: &str) -> Option<Node> {
    node.ancestors().find_map(|scope| {
        let type_params = match scope.kind() {
            NodeKind::Func { type_params, .. }
            | NodeKind::Proc { type_params, .. }
            | NodeKind::TypeDeclaration { type_params, .. }
            | NodeKind::FuncType { type_params, .. }
            | NodeKind::ProcType { type_params, .. } => type_params,
            _ => return None,
        };
        type_params
            .iter()
            .map(|id| scope.child(*id))
            .find(|param| matches!(param.kind(), NodeKind::GenericParam { name: declared, .. } if declared == name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoImports;
    use crate::test_support::Source;

    fn annotation(source: &Source) -> Type {
        let decl = source.module.declarations().into_iter().last().unwrap();
        let NodeKind::ValueDeclaration {
            type_annotation: Some(t),
            ..
        } = decl.kind()
        else {
            panic!("expected an annotated declaration");
        };
        let analyzer = Analyzer::new(&NoImports);
        analyzer.expand(&analyzer.lower(&decl.child(*t)))
    }

    #[test]
    fn test_lower_structural_types() {
        let source = Source::new("const x: { a: number, b?: string[] } | [boolean, nil] = nil");
        assert_eq!(
            annotation(&source).to_string(),
            "{ a: number, b?: string[] } | [boolean, nil]"
        );
    }

    #[test]
    fn test_expand_generic_alias() {
        let source = Source::new("type Pair<T> = [T, T]\nconst p: Pair<number> = [1, 2]");
        assert_eq!(
            annotation(&source),
            Type::Tuple(vec![Type::Number, Type::Number])
        );
    }

    #[test]
    fn test_expand_missing_alias_argument_uses_constraint() {
        let source = Source::new("type Boxed<T extends string> = { v: T }\nconst b: Boxed = { v: 'a' }");
        assert_eq!(annotation(&source), Type::object([("v", Type::String)]));
    }

    #[test]
    fn test_expand_unknown_name() {
        let source = Source::new("const x: Missing = 1");
        assert_eq!(annotation(&source), Type::Unknown);
    }

    #[test]
    fn test_self_referential_alias_terminates() {
        let source = Source::new("type Loop = Loop\nconst x: Loop = 1");
        assert_eq!(annotation(&source), Type::Unknown);
    }

    #[test]
    fn test_generic_param_in_signature() {
        let source = Source::new("const f: <T extends number>(a: T) => T[] = nil");
        let Type::Func {
            type_params, args, ..
        } = annotation(&source)
        else {
            panic!("expected func type");
        };
        assert_eq!(type_params[0].fallback(), Type::Number);
        assert_eq!(
            args[0].ty,
            Some(Type::Generic {
                name: "T".into(),
                extends: Some(Box::new(Type::Number)),
            })
        );
    }
}

//! Structural assignability between types.

use bagel_ast::LiteralValue;

use crate::analyzer::{Analyzer, MAX_SUBSUMPTION_DEPTH};
use crate::types::{FuncArg, Type};

impl Analyzer<'_> {
    /// Whether a value of type `value` may be used where `destination` is
    /// expected. With `resolve_generics`, a generic parameter on either side
    /// is compared as its constraint.
    pub fn subsumes(&self, destination: &Type, value: &Type, resolve_generics: bool) -> bool {
        let depth = self.depth.get();
        if depth >= MAX_SUBSUMPTION_DEPTH {
            tracing::debug!(%destination, %value, "subsumption depth limit reached");
            return false;
        }

        let named = matches!(destination, Type::Named { .. }) || matches!(value, Type::Named { .. });
        if named {
            let pair = (destination.clone(), value.clone());
            if self.comparing.borrow().contains(&pair) {
                return true;
            }
            self.comparing.borrow_mut().push(pair);
        }

        self.depth.set(depth + 1);
        let destination = self.resolve_side(destination, resolve_generics);
        let value = self.resolve_side(value, resolve_generics);
        let result = self.subsumes_resolved(&destination, &value, resolve_generics);
        self.depth.set(depth);

        if named {
            self.comparing.borrow_mut().pop();
        }
        result
    }

    fn resolve_side(&self, ty: &Type, resolve_generics: bool) -> Type {
        match self.expand(ty) {
            Type::Generic { extends, .. } if resolve_generics => extends
                .map(|extends| self.expand(&extends))
                .unwrap_or(Type::Unknown),
            other => other,
        }
    }

    fn subsumes_resolved(&self, destination: &Type, value: &Type, resolve_generics: bool) -> bool {
        let sub = |d: &Type, v: &Type| self.subsumes(d, v, resolve_generics);

        if destination == value {
            return true;
        }

        match (destination, value) {
            (Type::Any, _) | (_, Type::Any) | (Type::Unknown, _) => return true,
            (_, Type::Unknown) => return false,
            (_, Type::Escape) => return true,
            (Type::Number, Type::Literal(LiteralValue::Number(_)))
            | (Type::String, Type::Literal(LiteralValue::String(_)))
            | (Type::Boolean, Type::Literal(LiteralValue::Boolean(_))) => return true,
            (Type::Union(_), Type::Union(_)) => {
                let targets = destination.flatten();
                return value
                    .flatten()
                    .iter()
                    .all(|member| targets.iter().any(|target| sub(target, member)));
            }
            (Type::Union(members), _) => return members.iter().any(|member| sub(member, value)),
            (Type::Readonly(d), Type::Readonly(v)) => return sub(d, v),
            (Type::Readonly(d), _) => return sub(d, value),
            (_, Type::Readonly(_)) => return false,
            (_, Type::Union(members)) => return members.iter().all(|member| sub(destination, member)),
            _ => {}
        }

        match (destination, value) {
            (
                Type::Func {
                    args: d_args,
                    returns: d_returns,
                    ..
                },
                Type::Func {
                    args: v_args,
                    returns: v_returns,
                    ..
                },
            ) => self.args_accept(d_args, v_args, resolve_generics) && sub(d_returns, v_returns),
            (Type::Proc { args: d_args, .. }, Type::Proc { args: v_args, .. }) => {
                self.args_accept(d_args, v_args, resolve_generics)
            }
            (Type::Array(d), Type::Array(v)) => sub(d, v),
            (Type::Array(d), Type::Tuple(items)) => items.iter().all(|item| sub(d, item)),
            (Type::Tuple(ds), Type::Tuple(vs)) => {
                ds.len() == vs.len() && ds.iter().zip(vs).all(|(d, v)| sub(d, v))
            }
            (Type::Object(d_entries), Type::Object(v_entries)) => {
                d_entries.iter().all(|d| {
                    match v_entries.iter().find(|v| v.name == d.name) {
                        Some(v) => (d.optional || !v.optional) && sub(&d.ty, &v.ty),
                        None => d.optional,
                    }
                })
            }
            (
                Type::Indexer { key, value: d_value },
                Type::Indexer {
                    key: v_key,
                    value: v_value,
                },
            ) => sub(key, v_key) && sub(d_value, v_value),
            (Type::Indexer { key, value: d_value }, Type::Object(entries)) => {
                entries.iter().all(|entry| {
                    sub(key, &Type::string_literal(entry.name.clone())) && sub(d_value, &entry.ty)
                })
            }
            (Type::Iterator(d), Type::Iterator(v)) | (Type::Plan(d), Type::Plan(v)) => sub(d, v),
            (_, Type::Generic {
                extends: Some(extends),
                ..
            }) => sub(destination, extends),
            _ => false,
        }
    }

    /// Contravariant argument check: every argument the value declares must
    /// accept what the destination would pass in that position. The value may
    /// declare fewer arguments.
    fn args_accept(&self, destination: &[FuncArg], value: &[FuncArg], resolve_generics: bool) -> bool {
        value.len() <= destination.len()
            && value.iter().zip(destination).all(|(v, d)| {
                self.subsumes(&v.ty_or_unknown(), &d.ty_or_unknown(), resolve_generics)
            })
    }

    /// The members of `ty` not covered by `removed`.
    pub fn subtract(&self, ty: &Type, removed: &Type) -> Type {
        let members = self
            .expand(ty)
            .flatten()
            .into_iter()
            .flat_map(|member| self.expand(&member).flatten())
            .filter(|member| {
                matches!(member, Type::Any | Type::Unknown) || !self.subsumes(removed, member, false)
            })
            .collect();
        Type::collapse(members)
    }

    /// Union of `types` with every member that another member already
    /// covers dropped. Of two mutually assignable members the first stays.
    pub(crate) fn distill_union(&self, types: Vec<Type>) -> Type {
        let members = Type::union(types).flatten();
        let kept = members
            .iter()
            .enumerate()
            .filter(|&(i, member)| {
                !members.iter().enumerate().any(|(j, other)| {
                    j != i
                        && self.subsumes(other, member, false)
                        && (j < i || !self.subsumes(member, other, false))
                })
            })
            .map(|(_, member)| member.clone())
            .collect();
        Type::collapse(kept)
    }
}

//! Semantic types.
//!
//! Types are plain values compared structurally. Position metadata (the
//! [`Origin`] a named type was written at) never takes part in equality,
//! but a store type is the store declaration itself.

use std::fmt;

use bagel_ast::{LiteralValue, Node};

/// Where a type reference was written; used to re-resolve the name lazily.
#[derive(Clone)]
pub struct Origin(pub Node);

impl PartialEq for Origin {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    String,
    Number,
    Boolean,
    Nil,
    Unknown,
    Any,
    Literal(LiteralValue),
    Union(Vec<Type>),
    Array(Box<Type>),
    Tuple(Vec<Type>),
    Object(Vec<ObjectEntry>),
    Indexer {
        key: Box<Type>,
        value: Box<Type>,
    },
    Func {
        type_params: Vec<TypeParam>,
        args: Vec<FuncArg>,
        returns: Box<Type>,
    },
    Proc {
        type_params: Vec<TypeParam>,
        args: Vec<FuncArg>,
    },
    /// Reference to a type alias, nominal type or store type by name;
    /// expanded on demand.
    Named {
        name: String,
        args: Vec<Type>,
        origin: Origin,
    },
    Nominal {
        name: String,
        inner: Box<Type>,
    },
    /// A type parameter in scope.
    Generic {
        name: String,
        extends: Option<Box<Type>>,
    },
    Iterator(Box<Type>),
    Plan(Box<Type>),
    Readonly(Box<Type>),
    /// The singleton instance of a store.
    Store { name: String, declaration: Node },
    /// Type of an embedded host-language escape; accepted anywhere.
    Escape,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObjectEntry {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
}

/// A func/proc argument. `ty` is `None` for an un-annotated literal
/// parameter and compares as `unknown`.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncArg {
    pub name: String,
    pub ty: Option<Type>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub extends: Option<Type>,
}

impl ObjectEntry {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }
}

impl FuncArg {
    pub fn ty_or_unknown(&self) -> Type {
        self.ty.clone().unwrap_or(Type::Unknown)
    }
}

impl TypeParam {
    /// What the parameter stands for when it cannot be bound.
    pub fn fallback(&self) -> Type {
        self.extends.clone().unwrap_or(Type::Unknown)
    }
}

impl Type {
    pub fn string_literal(value: impl Into<String>) -> Self {
        Type::Literal(LiteralValue::String(value.into()))
    }

    pub fn number_literal(value: f64) -> Self {
        Type::Literal(LiteralValue::Number(value))
    }

    pub fn array(element: Type) -> Self {
        Type::Array(Box::new(element))
    }

    pub fn object(entries: impl IntoIterator<Item = (&'static str, Type)>) -> Self {
        Type::Object(
            entries
                .into_iter()
                .map(|(name, ty)| ObjectEntry::new(name, ty))
                .collect(),
        )
    }

    pub fn func(args: Vec<Type>, returns: Type) -> Self {
        Type::Func {
            type_params: Vec::new(),
            args: args
                .into_iter()
                .enumerate()
                .map(|(i, ty)| FuncArg {
                    name: format!("arg{i}"),
                    ty: Some(ty),
                })
                .collect(),
            returns: Box::new(returns),
        }
    }

    /// Build a union: nested unions are inlined, structural duplicates
    /// dropped, and a single member is returned bare.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Type {
        let mut flat = Vec::new();
        for member in members {
            member.flatten_into(&mut flat);
        }
        let mut unique: Vec<Type> = Vec::with_capacity(flat.len());
        for member in flat {
            if !unique.contains(&member) {
                unique.push(member);
            }
        }
        Type::collapse(unique)
    }

    pub(crate) fn collapse(mut members: Vec<Type>) -> Type {
        if members.len() == 1 {
            members.remove(0)
        } else {
            Type::Union(members)
        }
    }

    fn flatten_into(self, out: &mut Vec<Type>) {
        match self {
            Type::Union(members) => {
                for member in members {
                    member.flatten_into(out);
                }
            }
            other => out.push(other),
        }
    }

    /// Members of a union with nested unions inlined; any other type is its
    /// own single member.
    pub fn flatten(&self) -> Vec<Type> {
        let mut out = Vec::new();
        self.clone().flatten_into(&mut out);
        out
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// Literal types become their primitive, recursively through arrays,
    /// tuples, objects and unions.
    pub fn widen(&self) -> Type {
        match self {
            Type::Literal(LiteralValue::Number(_)) => Type::Number,
            Type::Literal(LiteralValue::String(_)) => Type::String,
            Type::Literal(LiteralValue::Boolean(_)) => Type::Boolean,
            Type::Union(members) => Type::union(members.iter().map(Type::widen)),
            Type::Array(element) => Type::array(element.widen()),
            Type::Tuple(elements) if !elements.is_empty() => {
                Type::Tuple(elements.iter().map(Type::widen).collect())
            }
            Type::Object(entries) => Type::Object(
                entries
                    .iter()
                    .map(|entry| ObjectEntry {
                        ty: entry.ty.widen(),
                        ..entry.clone()
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Whether a generic parameter named in `names` occurs anywhere inside.
    pub fn mentions_generic(&self, names: &[String]) -> bool {
        let mut found = false;
        self.visit(&mut |ty| {
            if let Type::Generic { name, .. } = ty {
                found |= names.contains(name);
            }
        });
        found
    }

    fn visit(&self, f: &mut impl FnMut(&Type)) {
        f(self);
        match self {
            Type::Union(members) | Type::Tuple(members) => {
                members.iter().for_each(|member| member.visit(f))
            }
            Type::Array(inner)
            | Type::Iterator(inner)
            | Type::Plan(inner)
            | Type::Readonly(inner) => inner.visit(f),
            Type::Object(entries) => entries.iter().for_each(|entry| entry.ty.visit(f)),
            Type::Indexer { key, value } => {
                key.visit(f);
                value.visit(f);
            }
            Type::Func { args, returns, .. } => {
                args.iter().flat_map(|arg| &arg.ty).for_each(|ty| ty.visit(f));
                returns.visit(f);
            }
            Type::Proc { args, .. } => {
                args.iter().flat_map(|arg| &arg.ty).for_each(|ty| ty.visit(f))
            }
            Type::Named { args, .. } => args.iter().for_each(|arg| arg.visit(f)),
            Type::Nominal { inner, .. } => inner.visit(f),
            _ => {}
        }
    }

    /// Replace generic parameters by name. Parameters re-declared by a nested
    /// func/proc type shadow the outer binding.
    pub fn substitute(&self, bindings: &[(String, Type)]) -> Type {
        if bindings.is_empty() {
            return self.clone();
        }
        let sub = |ty: &Type| ty.substitute(bindings);
        let sub_box = |ty: &Type| Box::new(ty.substitute(bindings));
        match self {
            Type::Generic { name, .. } => bindings
                .iter()
                .find(|(bound, _)| bound == name)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_else(|| self.clone()),
            Type::Union(members) => Type::union(members.iter().map(sub)),
            Type::Tuple(elements) => Type::Tuple(elements.iter().map(sub).collect()),
            Type::Array(inner) => Type::Array(sub_box(inner)),
            Type::Iterator(inner) => Type::Iterator(sub_box(inner)),
            Type::Plan(inner) => Type::Plan(sub_box(inner)),
            Type::Readonly(inner) => Type::Readonly(sub_box(inner)),
            Type::Object(entries) => Type::Object(
                entries
                    .iter()
                    .map(|entry| ObjectEntry {
                        ty: sub(&entry.ty),
                        ..entry.clone()
                    })
                    .collect(),
            ),
            Type::Indexer { key, value } => Type::Indexer {
                key: sub_box(key),
                value: sub_box(value),
            },
            Type::Named { name, args, origin } => Type::Named {
                name: name.clone(),
                args: args.iter().map(sub).collect(),
                origin: origin.clone(),
            },
            Type::Nominal { name, inner } => Type::Nominal {
                name: name.clone(),
                inner: sub_box(inner),
            },
            Type::Func {
                type_params,
                args,
                returns,
            } => {
                let inner = shadowed(bindings, type_params);
                Type::Func {
                    type_params: type_params.clone(),
                    args: substitute_args(args, &inner),
                    returns: Box::new(returns.substitute(&inner)),
                }
            }
            Type::Proc { type_params, args } => {
                let inner = shadowed(bindings, type_params);
                Type::Proc {
                    type_params: type_params.clone(),
                    args: substitute_args(args, &inner),
                }
            }
            _ => self.clone(),
        }
    }
}

fn shadowed(bindings: &[(String, Type)], params: &[TypeParam]) -> Vec<(String, Type)> {
    bindings
        .iter()
        .filter(|(name, _)| !params.iter().any(|param| &param.name == name))
        .cloned()
        .collect()
}

fn substitute_args(args: &[FuncArg], bindings: &[(String, Type)]) -> Vec<FuncArg> {
    args.iter()
        .map(|arg| FuncArg {
            name: arg.name.clone(),
            ty: arg.ty.as_ref().map(|ty| ty.substitute(bindings)),
        })
        .collect()
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Boolean => f.write_str("boolean"),
            Type::Nil => f.write_str("nil"),
            Type::Unknown => f.write_str("unknown"),
            Type::Any => f.write_str("any"),
            Type::Escape => f.write_str("escape"),
            Type::Literal(value) => write!(f, "{value}"),
            Type::Union(members) if members.is_empty() => f.write_str("never"),
            Type::Union(members) => write_list(f, members, " | "),
            Type::Array(element) => match **element {
                Type::Union(_) | Type::Func { .. } | Type::Proc { .. } | Type::Readonly(_) => {
                    write!(f, "({element})[]")
                }
                _ => write!(f, "{element}[]"),
            },
            Type::Tuple(elements) => {
                f.write_str("[")?;
                write_list(f, elements, ", ")?;
                f.write_str("]")
            }
            Type::Object(entries) if entries.is_empty() => f.write_str("{}"),
            Type::Object(entries) => {
                f.write_str("{ ")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let mark = if entry.optional { "?" } else { "" };
                    write!(f, "{}{mark}: {}", entry.name, entry.ty)?;
                }
                f.write_str(" }")
            }
            Type::Indexer { key, value } => write!(f, "{{[{key}]: {value}}}"),
            Type::Func {
                type_params,
                args,
                returns,
            } => {
                write_signature(f, type_params, args)?;
                write!(f, " => {returns}")
            }
            Type::Proc { type_params, args } => {
                write_signature(f, type_params, args)?;
                f.write_str(" {}")
            }
            Type::Named { name, args, .. } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            Type::Nominal { name, .. } | Type::Generic { name, .. } | Type::Store { name, .. } => {
                f.write_str(name)
            }
            Type::Iterator(inner) => write!(f, "Iterator<{inner}>"),
            Type::Plan(inner) => write!(f, "Plan<{inner}>"),
            Type::Readonly(inner) => write!(f, "readonly {inner}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Type], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_signature(
    f: &mut fmt::Formatter<'_>,
    type_params: &[TypeParam],
    args: &[FuncArg],
) -> fmt::Result {
    if !type_params.is_empty() {
        f.write_str("<")?;
        for (i, param) in type_params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&param.name)?;
            if let Some(extends) = &param.extends {
                write!(f, " extends {extends}")?;
            }
        }
        f.write_str(">")?;
    }
    f.write_str("(")?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(&arg.name)?;
        if let Some(ty) = &arg.ty {
            write!(f, ": {ty}")?;
        }
    }
    f.write_str(")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_flattens_and_collapses() {
        let nested = Type::union([
            Type::Number,
            Type::Union(vec![Type::Nil, Type::Union(vec![Type::Number])]),
        ]);
        assert_eq!(nested, Type::Union(vec![Type::Number, Type::Nil]));

        let single = Type::union([Type::Union(vec![Type::String]), Type::String]);
        assert_eq!(single, Type::String);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let ty = Type::union([Type::Number, Type::union([Type::Nil, Type::String])]);
        let once = ty.flatten();
        assert!(once.iter().all(|member| !matches!(member, Type::Union(_))));
        assert_eq!(Type::collapse(once.clone()).flatten(), once);
    }

    #[test]
    fn test_widen_is_recursive() {
        let ty = Type::object([
            ("a", Type::number_literal(1.0)),
            ("b", Type::array(Type::string_literal("x"))),
        ]);
        assert_eq!(
            ty.widen(),
            Type::object([("a", Type::Number), ("b", Type::array(Type::String))])
        );
    }

    #[test]
    fn test_substitute_respects_shadowing() {
        let t = || Type::Generic {
            name: "T".into(),
            extends: None,
        };
        let inner = Type::Func {
            type_params: vec![TypeParam {
                name: "T".into(),
                extends: None,
            }],
            args: vec![],
            returns: Box::new(t()),
        };
        let outer = Type::Tuple(vec![t(), inner.clone()]);
        let bound = outer.substitute(&[("T".into(), Type::Number)]);
        assert_eq!(bound, Type::Tuple(vec![Type::Number, inner]));
    }

    #[test]
    fn test_display() {
        let ty = Type::Func {
            type_params: vec![TypeParam {
                name: "T".into(),
                extends: Some(Type::Number),
            }],
            args: vec![
                FuncArg {
                    name: "a".into(),
                    ty: Some(Type::array(Type::union([Type::Number, Type::Nil]))),
                },
                FuncArg {
                    name: "b".into(),
                    ty: None,
                },
            ],
            returns: Box::new(Type::string_literal("foo")),
        };
        assert_eq!(ty.to_string(), "<T extends number>(a: (number | nil)[], b) => 'foo'");

        let obj = Type::Object(vec![ObjectEntry {
            name: "bar".into(),
            ty: Type::Number,
            optional: true,
        }]);
        assert_eq!(obj.to_string(), "{ bar?: number }");
        assert_eq!(Type::Object(vec![]).to_string(), "{}");
    }
}

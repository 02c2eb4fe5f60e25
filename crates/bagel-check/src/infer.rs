//! Type inference for expressions and declarations.

use bagel_ast::{BinaryOp, LiteralValue, Node, NodeKind, UnaryOp};

use crate::analyzer::{Analyzer, MAX_SUBSUMPTION_DEPTH};
use crate::binding::{Binding, Namespace};
use crate::resolve::is_exported;
use crate::types::{FuncArg, ObjectEntry, Type, TypeParam};

/// An invocation or pipe, normalized: the callee's type and the argument
/// nodes in parameter order.
pub(crate) struct Call {
    /// The node whose value is being called.
    pub(crate) callee: Node,
    pub(crate) subject: Type,
    pub(crate) type_args: Vec<Node>,
    /// For a method-style call, the receiver comes first.
    pub(crate) args: Vec<Node>,
    /// Type of the receiver of a method-style call, inferred once.
    pub(crate) receiver: Option<Type>,
}

impl Analyzer<'_> {
    /// The type of `node`. With `preserve_generics` unset, a generic func or
    /// proc type has its parameters replaced by their constraints.
    pub fn infer(&self, node: &Node, preserve_generics: bool) -> Type {
        let ty = self.guarded(node, Type::Unknown, || self.infer_uncached(node));
        if preserve_generics {
            ty
        } else {
            erase_generics(ty)
        }
    }

    fn infer_uncached(&self, node: &Node) -> Type {
        let child = |id: &bagel_ast::NodeId| node.child(*id);
        match node.kind() {
            NodeKind::NumberLiteral(n) => Type::number_literal(*n),
            NodeKind::StringLiteral(s) => Type::string_literal(s.clone()),
            NodeKind::BooleanLiteral(b) => Type::Literal(LiteralValue::Boolean(*b)),
            NodeKind::NilLiteral => Type::Nil,
            NodeKind::JavascriptEscape(_) => Type::Escape,
            NodeKind::LocalIdentifier(name) => match self.resolve(name, node) {
                Ok(binding) => self.binding_type(&binding),
                Err(_) => Type::Unknown,
            },
            NodeKind::This => enclosing_store(node)
                .map(|store| store_type(&store))
                .unwrap_or(Type::Unknown),
            NodeKind::BinaryOperation { left, op, right } => {
                let left = self.infer(&child(left), true);
                let right = self.infer(&child(right), true);
                if *op == BinaryOp::NullishCoalescing {
                    let present = self.subtract(&left, &Type::Nil);
                    self.distill_union(vec![present, right])
                } else {
                    self.binary_result(*op, &left, &right)
                        .unwrap_or(Type::Unknown)
                }
            }
            NodeKind::UnaryOperation { op, .. } => match op {
                UnaryOp::Not => Type::Boolean,
                UnaryOp::Negate => Type::Number,
            },
            NodeKind::Invocation { .. } | NodeKind::Pipe { .. } => self
                .call(node)
                .map(|call| self.call_result(&call))
                .unwrap_or(Type::Unknown),
            NodeKind::PropertyAccessor {
                subject,
                property,
                optional,
            } => {
                let base = self.expand(&self.infer(&child(subject), true));
                if *optional {
                    let base = self.subtract(&base, &Type::Nil);
                    self.property_type(&base, property)
                        .map(|ty| Type::union([ty, Type::Nil]))
                        .unwrap_or(Type::Unknown)
                } else {
                    self.property_type(&base, property)
                        .unwrap_or(Type::Unknown)
                }
            }
            NodeKind::IndexerAccess {
                subject,
                index,
                optional,
            } => {
                let base = self.expand(&self.infer(&child(subject), true));
                let index = self.infer(&child(index), true);
                if *optional {
                    let base = self.subtract(&base, &Type::Nil);
                    self.index_type(&base, &index)
                        .map(|ty| Type::union([ty, Type::Nil]))
                        .unwrap_or(Type::Unknown)
                } else {
                    self.index_type(&base, &index).unwrap_or(Type::Unknown)
                }
            }
            NodeKind::Func {
                type_params,
                params,
                return_type,
                body,
            } => Type::Func {
                type_params: self.type_params(node, type_params),
                args: self.literal_args(node, params),
                returns: Box::new(match return_type {
                    Some(t) => self.lower(&child(t)),
                    None => self.infer(&child(body), true),
                }),
            },
            NodeKind::Proc {
                type_params,
                params,
                ..
            } => Type::Proc {
                type_params: self.type_params(node, type_params),
                args: self.literal_args(node, params),
            },
            NodeKind::IfElseExpression { cases, default } => {
                let mut outcomes: Vec<Type> = cases
                    .iter()
                    .filter_map(|id| match child(id).kind() {
                        NodeKind::IfElseCase { outcome, .. } => {
                            Some(self.infer(&node.child(*outcome), true))
                        }
                        _ => None,
                    })
                    .collect();
                outcomes.push(self.default_outcome(node, *default));
                self.distill_union(outcomes)
            }
            NodeKind::SwitchExpression { cases, default, .. } => {
                let mut outcomes: Vec<Type> = cases
                    .iter()
                    .filter_map(|id| match child(id).kind() {
                        NodeKind::SwitchCase { outcome, .. } => {
                            Some(self.infer(&node.child(*outcome), true))
                        }
                        _ => None,
                    })
                    .collect();
                outcomes.push(self.default_outcome(node, *default));
                self.distill_union(outcomes)
            }
            NodeKind::ArrayLiteral(entries) if entries.is_empty() => Type::Tuple(Vec::new()),
            NodeKind::ArrayLiteral(entries) => Type::array(Type::union(
                entries.iter().map(|id| self.infer(&child(id), true)),
            )),
            NodeKind::ObjectLiteral(entries) => Type::Object(
                entries
                    .iter()
                    .filter_map(|id| match child(id).kind() {
                        NodeKind::ObjectEntry { key, value } => Some(ObjectEntry::new(
                            key.clone(),
                            self.infer(&node.child(*value), true),
                        )),
                        _ => None,
                    })
                    .collect(),
            ),
            NodeKind::Parenthesized(inner) => self.infer(&child(inner), true),
            NodeKind::InlineConst { body, .. } => self.infer(&child(body), true),
            NodeKind::Range { .. } => Type::Iterator(Box::new(Type::Number)),
            NodeKind::AsCast { type_expr, .. } => self.lower(&child(type_expr)),
            NodeKind::Param { .. } => node
                .parent()
                .and_then(|holder| {
                    let position = param_position(&holder, node)?;
                    Some(self.arg_type(&holder, position))
                })
                .unwrap_or(Type::Unknown),
            kind if kind.is_type_expression() => self.lower(node),
            _ => self.declaration_type(node),
        }
    }

    fn default_outcome(&self, node: &Node, default: Option<bagel_ast::NodeId>) -> Type {
        default
            .map(|id| self.infer(&node.child(id), true))
            .unwrap_or(Type::Nil)
    }

    /// The type a declaration gives its name.
    pub(crate) fn declaration_type(&self, decl: &Node) -> Type {
        let child = |id: &bagel_ast::NodeId| decl.child(*id);
        match decl.kind() {
            NodeKind::ValueDeclaration {
                type_annotation,
                value,
                is_const,
                ..
            }
            | NodeKind::DeclarationStatement {
                type_annotation,
                value,
                is_const,
                ..
            } => match type_annotation {
                Some(t) => self.lower(&child(t)),
                None if *is_const => self.infer(&child(value), true),
                None => self.infer(&child(value), true).widen(),
            },
            NodeKind::InlineConst {
                type_annotation,
                value,
                ..
            } => match type_annotation {
                Some(t) => self.lower(&child(t)),
                None => self.infer(&child(value), true),
            },
            NodeKind::StoreMember {
                type_annotation,
                value,
                ..
            } => match type_annotation {
                Some(t) => self.lower(&child(t)),
                None => self.infer(&child(value), true).widen(),
            },
            NodeKind::FuncDeclaration { func, .. } => self.infer(&child(func), true),
            NodeKind::ProcDeclaration { proc, .. } => self.infer(&child(proc), true),
            NodeKind::StoreDeclaration { .. } => store_type(decl),
            NodeKind::TypeDeclaration {
                name,
                value,
                nominal: true,
                ..
            } => {
                let inner = self.lower(&child(value));
                Type::Func {
                    type_params: Vec::new(),
                    args: vec![FuncArg {
                        name: "value".into(),
                        ty: Some(inner.clone()),
                    }],
                    returns: Box::new(Type::Nominal {
                        name: name.clone(),
                        inner: Box::new(inner),
                    }),
                }
            }
            _ => Type::Unknown,
        }
    }

    pub(crate) fn binding_type(&self, binding: &Binding) -> Type {
        match binding {
            Binding::Basic { declaration } => self.declaration_type(declaration),
            Binding::Arg { holder, index } => self.arg_type(holder, *index),
            Binding::Type { .. } => Type::Unknown,
            Binding::Module { import } => self.module_object(import),
            Binding::Iterator { for_loop } => match for_loop.kind() {
                NodeKind::ForLoop { iterator, .. } => {
                    match self.expand(&self.infer(&for_loop.child(*iterator), true)) {
                        Type::Iterator(item) => *item,
                        Type::Any => Type::Any,
                        _ => Type::Unknown,
                    }
                }
                _ => Type::Unknown,
            },
        }
    }

    /// A whole-module import seen as an object of its exported values.
    fn module_object(&self, import: &Node) -> Type {
        let NodeKind::ImportAllDeclaration { path, .. } = import.kind() else {
            return Type::Unknown;
        };
        let Some(target) = self.load(import, path) else {
            return Type::Unknown;
        };
        Type::Object(
            target
                .declarations()
                .into_iter()
                .filter(is_exported)
                .filter_map(|decl| {
                    let name = value_name(&decl)?;
                    Some(ObjectEntry::new(name, self.declaration_type(&decl)))
                })
                .collect(),
        )
    }

    /// Parameter `index` of a func or proc literal: its annotation, else the
    /// type its calling context expects there.
    fn arg_type(&self, holder: &Node, index: usize) -> Type {
        let (NodeKind::Func { params, .. } | NodeKind::Proc { params, .. }) = holder.kind() else {
            return Type::Unknown;
        };
        let Some(param) = params.get(index).map(|id| holder.child(*id)) else {
            return Type::Unknown;
        };
        if let NodeKind::Param {
            type_annotation: Some(t),
            ..
        } = param.kind()
        {
            return self.lower(&param.child(*t));
        }
        self.contextual_args(holder)
            .and_then(|args| args.get(index).map(FuncArg::ty_or_unknown))
            .unwrap_or(Type::Unknown)
    }

    fn literal_args(&self, holder: &Node, params: &[bagel_ast::NodeId]) -> Vec<FuncArg> {
        let mut args = self.declared_args(holder, params);
        if args.iter().any(|arg| arg.ty.is_none()) {
            if let Some(expected) = self.contextual_args(holder) {
                for (arg, context) in args.iter_mut().zip(expected) {
                    if arg.ty.is_none() {
                        arg.ty = context.ty;
                    }
                }
            }
        }
        args
    }

    /// Argument types the context of a func/proc literal expects, when the
    /// expected type is of the same call kind.
    fn contextual_args(&self, literal: &Node) -> Option<Vec<FuncArg>> {
        let expected = self.expand(&self.expected_type(literal)?);
        match (literal.kind(), expected) {
            (NodeKind::Func { .. }, Type::Func { args, .. })
            | (NodeKind::Proc { .. }, Type::Proc { args, .. }) => Some(args),
            _ => None,
        }
    }

    /// The type the surrounding construct requires `node` to have, if any.
    pub(crate) fn expected_type(&self, node: &Node) -> Option<Type> {
        if let Some(expected) = self.recorded_expectation(node) {
            return Some(expected);
        }
        let parent = node.parent()?;
        match parent.kind() {
            NodeKind::Parenthesized(_) => self.expected_type(&parent),
            NodeKind::ValueDeclaration {
                type_annotation: Some(t),
                value,
                ..
            }
            | NodeKind::DeclarationStatement {
                type_annotation: Some(t),
                value,
                ..
            }
            | NodeKind::StoreMember {
                type_annotation: Some(t),
                value,
                ..
            }
            | NodeKind::InlineConst {
                type_annotation: Some(t),
                value,
                ..
            } if *value == node.id() => Some(self.lower(&parent.child(*t))),
            NodeKind::Invocation { .. } => {
                let call = self.call(&parent)?;
                let position = call.args.iter().position(|arg| arg == node)?;
                let (type_params, params) = signature(&call.subject)?;
                let bindings = self.bind_generics(&call, type_params, params, false);
                params
                    .get(position)
                    .map(|param| param.ty_or_unknown().substitute(&bindings))
            }
            NodeKind::Pipe { value, function } if *function == node.id() => {
                let value = self.infer(&parent.child(*value), true).widen();
                Some(Type::func(vec![value], Type::Unknown))
            }
            _ => None,
        }
    }

    /// Normalize an invocation or pipe node into a [`Call`].
    pub(crate) fn call(&self, node: &Node) -> Option<Call> {
        match node.kind() {
            NodeKind::Invocation {
                subject,
                type_args,
                args,
            } => {
                let type_args = type_args.iter().map(|id| node.child(*id)).collect();
                let mut arg_nodes: Vec<Node> = args.iter().map(|id| node.child(*id)).collect();
                let callee = node.child(*subject);
                if let Some((receiver, receiver_ty, binding)) = self.method_call(node) {
                    arg_nodes.insert(0, receiver);
                    return Some(Call {
                        callee,
                        subject: self.expand(&self.binding_type(&binding)),
                        type_args,
                        args: arg_nodes,
                        receiver: Some(receiver_ty),
                    });
                }
                Some(Call {
                    subject: self.expand(&self.infer(&callee, true)),
                    callee,
                    type_args,
                    args: arg_nodes,
                    receiver: None,
                })
            }
            NodeKind::Pipe { value, function } => {
                let callee = node.child(*function);
                Some(Call {
                    subject: self.expand(&self.infer(&callee, true)),
                    callee,
                    type_args: Vec::new(),
                    args: vec![node.child(*value)],
                    receiver: None,
                })
            }
            _ => None,
        }
    }

    fn call_result(&self, call: &Call) -> Type {
        match &call.subject {
            Type::Func {
                type_params,
                args,
                returns,
            } => {
                let bindings = self.bind_generics(call, type_params, args, true);
                returns.substitute(&bindings)
            }
            Type::Any => Type::Any,
            Type::Escape => Type::Escape,
            _ => Type::Unknown,
        }
    }

    /// `a.f(x)` where `f` is not a property of `a` but a function in scope:
    /// the receiver node, its type and the function's binding.
    pub(crate) fn method_call(&self, invocation: &Node) -> Option<(Node, Type, Binding)> {
        let NodeKind::Invocation { subject, .. } = invocation.kind() else {
            return None;
        };
        let accessor = invocation.child(*subject);
        let NodeKind::PropertyAccessor {
            subject: receiver,
            property,
            optional: false,
        } = accessor.kind()
        else {
            return None;
        };
        let receiver = accessor.child(*receiver);
        let receiver_ty = self.infer(&receiver, true);
        if self.property_type(&self.expand(&receiver_ty), property).is_some() {
            return None;
        }
        let binding = self.resolve_in(property, &accessor, Namespace::Value).ok()?;
        Some((receiver, receiver_ty, binding))
    }

    /// The function a method-style invocation is rewritten to call.
    pub fn method_call_target(&self, invocation: &Node) -> Option<Binding> {
        self.method_call(invocation).map(|(_, _, binding)| binding)
    }

    /// Type of argument `index` of `call`, generics preserved.
    pub(crate) fn call_arg_type(&self, call: &Call, index: usize) -> Type {
        match (&call.receiver, index) {
            (Some(receiver), 0) => receiver.clone(),
            _ => call
                .args
                .get(index)
                .map(|arg| self.infer(arg, true))
                .unwrap_or(Type::Unknown),
        }
    }

    /// Bind the type parameters of a call: positionally from explicit type
    /// arguments, otherwise by matching parameter types against argument
    /// types. Un-annotated func/proc literal arguments are only consulted
    /// when `include_literals` is set, after every other argument; each is
    /// inferred once, expecting its parameter type under the bindings found
    /// so far.
    pub(crate) fn bind_generics(
        &self,
        call: &Call,
        type_params: &[TypeParam],
        params: &[FuncArg],
        include_literals: bool,
    ) -> Vec<(String, Type)> {
        if type_params.is_empty() {
            return Vec::new();
        }
        if !call.type_args.is_empty() {
            return type_params
                .iter()
                .enumerate()
                .map(|(i, param)| {
                    let ty = call
                        .type_args
                        .get(i)
                        .map(|arg| self.lower(arg))
                        .unwrap_or_else(|| param.fallback());
                    (param.name.clone(), ty)
                })
                .collect();
        }

        let names: Vec<String> = type_params.iter().map(|param| param.name.clone()).collect();
        let generic_args: Vec<(usize, &Type, &Node)> = params
            .iter()
            .zip(&call.args)
            .enumerate()
            .filter_map(|(index, (param, arg))| {
                let param_ty = param.ty.as_ref()?;
                param_ty.mentions_generic(&names).then_some((index, param_ty, arg))
            })
            .collect();

        let mut bound = Vec::new();
        for &(index, param_ty, arg) in &generic_args {
            if !needs_context(arg) {
                let arg_ty = self.call_arg_type(call, index).widen();
                self.match_generics(param_ty, &arg_ty, &names, &mut bound, 0);
            }
        }
        if include_literals {
            let settled = complete_bindings(type_params, &bound);
            for &(_, param_ty, arg) in &generic_args {
                if needs_context(arg) {
                    let expected = param_ty.substitute(&settled);
                    let arg_ty = self.expecting(arg, expected, || self.infer(arg, true));
                    self.match_generics(param_ty, &arg_ty, &names, &mut bound, 0);
                }
            }
        }
        complete_bindings(type_params, &bound)
    }

    /// Walk `param` and `arg` in parallel, binding each generic parameter of
    /// `names` to the argument type found at its position. The first binding
    /// of a name wins.
    fn match_generics(
        &self,
        param: &Type,
        arg: &Type,
        names: &[String],
        bound: &mut Vec<(String, Type)>,
        depth: usize,
    ) {
        if depth > MAX_SUBSUMPTION_DEPTH {
            return;
        }
        let recurse = |p: &Type, a: &Type, bound: &mut Vec<(String, Type)>| {
            self.match_generics(p, a, names, bound, depth + 1)
        };
        match (param, arg) {
            (Type::Generic { name, .. }, _) if names.contains(name) => {
                if !bound.iter().any(|(bound_name, _)| bound_name == name) {
                    bound.push((name.clone(), arg.clone()));
                }
            }
            (
                Type::Named {
                    name: p_name,
                    args: p_args,
                    ..
                },
                Type::Named {
                    name: a_name,
                    args: a_args,
                    ..
                },
            ) if p_name == a_name => {
                for (p, a) in p_args.iter().zip(a_args) {
                    recurse(p, a, bound);
                }
            }
            (Type::Named { .. }, _) => {
                let expanded = self.expand(param);
                if !matches!(expanded, Type::Named { .. } | Type::Unknown) {
                    recurse(&expanded, arg, bound);
                }
            }
            (_, Type::Named { .. }) => {
                let expanded = self.expand(arg);
                if !matches!(expanded, Type::Named { .. } | Type::Unknown) {
                    recurse(param, &expanded, bound);
                }
            }
            (Type::Union(members), _) => {
                let (generic, concrete): (Vec<&Type>, Vec<&Type>) = members
                    .iter()
                    .partition(|member| member.mentions_generic(names));
                if let [generic] = generic.as_slice() {
                    let rest: Vec<Type> = arg
                        .flatten()
                        .into_iter()
                        .filter(|member| {
                            !concrete
                                .iter()
                                .any(|c| self.subsumes(c, member, false))
                        })
                        .collect();
                    if !rest.is_empty() {
                        recurse(*generic, &Type::collapse(rest), bound);
                    }
                }
            }
            (Type::Array(p), Type::Array(a))
            | (Type::Iterator(p), Type::Iterator(a))
            | (Type::Plan(p), Type::Plan(a))
            | (Type::Readonly(p), Type::Readonly(a)) => recurse(p, a, bound),
            (Type::Readonly(p), _) => recurse(p, arg, bound),
            (Type::Array(p), Type::Tuple(items)) if !items.is_empty() => {
                recurse(p, &Type::union(items.iter().cloned()), bound)
            }
            (Type::Tuple(ps), Type::Tuple(items)) => {
                for (p, a) in ps.iter().zip(items) {
                    recurse(p, a, bound);
                }
            }
            (Type::Object(ps), Type::Object(entries)) => {
                for p in ps {
                    if let Some(a) = entries.iter().find(|entry| entry.name == p.name) {
                        recurse(&p.ty, &a.ty, bound);
                    }
                }
            }
            (
                Type::Indexer { key, value },
                Type::Indexer {
                    key: a_key,
                    value: a_value,
                },
            ) => {
                recurse(key, a_key, bound);
                recurse(value, a_value, bound);
            }
            (
                Type::Func {
                    args: p_args,
                    returns: p_returns,
                    ..
                },
                Type::Func {
                    args: a_args,
                    returns: a_returns,
                    ..
                },
            ) => {
                match_arg_lists(p_args, a_args, &mut |p, a| recurse(p, a, bound));
                recurse(p_returns, a_returns, bound);
            }
            (Type::Proc { args: p_args, .. }, Type::Proc { args: a_args, .. }) => {
                match_arg_lists(p_args, a_args, &mut |p, a| recurse(p, a, bound));
            }
            _ => {}
        }
    }

    /// Type of property `name` on an already expanded type.
    pub(crate) fn property_type(&self, ty: &Type, name: &str) -> Option<Type> {
        match ty {
            Type::Object(entries) => entries.iter().find(|entry| entry.name == name).map(|entry| {
                if entry.optional {
                    Type::union([entry.ty.clone(), Type::Nil])
                } else {
                    entry.ty.clone()
                }
            }),
            Type::Store { declaration, .. } => {
                store_member(declaration, name).map(|member| self.declaration_type(&member))
            }
            Type::Nominal { inner, .. } if name == "value" => Some((**inner).clone()),
            Type::Array(_)
            | Type::Tuple(_)
            | Type::String
            | Type::Literal(LiteralValue::String(_))
                if name == "length" =>
            {
                Some(Type::Number)
            }
            Type::Readonly(inner) => self.property_type(&self.expand(inner), name),
            Type::Union(members) if !members.is_empty() => {
                let found: Option<Vec<Type>> = members
                    .iter()
                    .map(|member| self.property_type(&self.expand(member), name))
                    .collect();
                found.map(Type::union)
            }
            Type::Any => Some(Type::Any),
            _ => None,
        }
    }

    /// Type of `base[index]` on an already expanded base.
    pub(crate) fn index_type(&self, base: &Type, index: &Type) -> Option<Type> {
        let index = self.expand(index);
        match base {
            Type::Object(_) => match &index {
                Type::Literal(LiteralValue::String(key)) => self.property_type(base, key),
                _ => None,
            },
            Type::Indexer { key, value } => self
                .subsumes(key, &index, false)
                .then(|| Type::union([(**value).clone(), Type::Nil])),
            Type::Array(element) => self
                .subsumes(&Type::Number, &index, false)
                .then(|| (**element).clone()),
            Type::Tuple(items) => match &index {
                Type::Literal(LiteralValue::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => {
                    items.get(*n as usize).cloned()
                }
                _ if self.subsumes(&Type::Number, &index, false) => {
                    Some(Type::union(items.iter().cloned()))
                }
                _ => None,
            },
            Type::Readonly(inner) => self.index_type(&self.expand(inner), &index),
            Type::Any => Some(Type::Any),
            _ => None,
        }
    }
}

/// The signature of a callable type.
pub(crate) fn signature(ty: &Type) -> Option<(&[TypeParam], &[FuncArg])> {
    match ty {
        Type::Func {
            type_params, args, ..
        }
        | Type::Proc { type_params, args } => Some((type_params, args)),
        _ => None,
    }
}

/// A func or proc literal with an un-annotated parameter; its type depends on
/// the call it is passed to.
/// One binding per type parameter: the bound type, else its fallback.
fn complete_bindings(type_params: &[TypeParam], bound: &[(String, Type)]) -> Vec<(String, Type)> {
    type_params
        .iter()
        .map(|param| {
            let ty = bound
                .iter()
                .find(|(name, _)| *name == param.name)
                .map(|(_, ty)| ty.clone())
                .unwrap_or_else(|| param.fallback());
            (param.name.clone(), ty)
        })
        .collect()
}

fn needs_context(arg: &Node) -> bool {
    match arg.kind() {
        NodeKind::Func { params, .. } | NodeKind::Proc { params, .. } => {
            params.iter().any(|id| {
                matches!(
                    arg.child(*id).kind(),
                    NodeKind::Param {
                        type_annotation: None,
                        ..
                    }
                )
            })
        }
        NodeKind::Parenthesized(inner) => needs_context(&arg.child(*inner)),
        _ => false,
    }
}

fn match_arg_lists(params: &[FuncArg], args: &[FuncArg], f: &mut impl FnMut(&Type, &Type)) {
    for (p, a) in params.iter().zip(args) {
        if let (Some(p), Some(a)) = (&p.ty, &a.ty) {
            f(p, a);
        }
    }
}

pub(crate) fn erase_generics(ty: Type) -> Type {
    match ty {
        Type::Func {
            type_params,
            args,
            returns,
        } if !type_params.is_empty() => {
            let bindings = fallbacks(&type_params);
            Type::Func {
                type_params: Vec::new(),
                args,
                returns,
            }
            .substitute(&bindings)
        }
        Type::Proc { type_params, args } if !type_params.is_empty() => {
            let bindings = fallbacks(&type_params);
            Type::Proc {
                type_params: Vec::new(),
                args,
            }
            .substitute(&bindings)
        }
        other => other,
    }
}

fn fallbacks(type_params: &[TypeParam]) -> Vec<(String, Type)> {
    type_params
        .iter()
        .map(|param| (param.name.clone(), param.fallback()))
        .collect()
}

fn param_position(holder: &Node, param: &Node) -> Option<usize> {
    match holder.kind() {
        NodeKind::Func { params, .. } | NodeKind::Proc { params, .. } => {
            params.iter().position(|id| *id == param.id())
        }
        _ => None,
    }
}

/// The name a declaration binds in the value namespace.
pub(crate) fn value_name(decl: &Node) -> Option<&str> {
    match decl.kind() {
        NodeKind::FuncDeclaration { name, .. }
        | NodeKind::ProcDeclaration { name, .. }
        | NodeKind::ValueDeclaration { name, .. }
        | NodeKind::StoreDeclaration { name, .. }
        | NodeKind::TypeDeclaration {
            name,
            nominal: true,
            ..
        } => Some(name),
        _ => None,
    }
}

pub(crate) fn enclosing_store(node: &Node) -> Option<Node> {
    node.ancestors()
        .find(|ancestor| matches!(ancestor.kind(), NodeKind::StoreDeclaration { .. }))
}

fn store_type(store: &Node) -> Type {
    match store.kind() {
        NodeKind::StoreDeclaration { name, .. } => Type::Store {
            name: name.clone(),
            declaration: store.clone(),
        },
        _ => Type::Unknown,
    }
}

/// The member declaration `name` of a store.
pub(crate) fn store_member(store: &Node, name: &str) -> Option<Node> {
    store.children().into_iter().find(|member| {
        matches!(member.kind(), NodeKind::StoreMember { name: declared, .. } if declared == name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoImports;
    use crate::test_support::{Source, TestLoader};

    /// Type of the `index`th top-level declaration.
    fn decl_type(text: &str, index: usize) -> String {
        let source = Source::new(text);
        Analyzer::new(&NoImports)
            .infer(&source.decl(index), false)
            .to_string()
    }

    fn last_decl_type(text: &str) -> String {
        let source = Source::new(text);
        let index = source.module.declarations().len() - 1;
        decl_type(text, index)
    }

    #[test]
    fn test_literals_and_widening() {
        assert_eq!(decl_type("const a = 12", 0), "12");
        assert_eq!(decl_type("let a = 12", 0), "number");
        assert_eq!(decl_type("let a = { b: 'x', c: [true] }", 0), "{ b: string, c: boolean[] }");
        assert_eq!(decl_type("const a = nil", 0), "nil");
    }

    #[test]
    fn test_binary_operators() {
        assert_eq!(last_decl_type("const b = 12\nconst a = b + 2"), "number");
        assert_eq!(last_decl_type("const a = 'n' + 2"), "string");
        assert_eq!(last_decl_type("const a = 1 < 2 && true"), "boolean");
        assert_eq!(last_decl_type("const a = true + 1"), "unknown");
    }

    #[test]
    fn test_nullish_coalescing_removes_nil() {
        let text = "func f(a: number | nil) => a ?? 'none'";
        assert_eq!(decl_type(text, 0), "(a: number | nil) => number | 'none'");
    }

    #[test]
    fn test_func_return_from_body() {
        assert_eq!(decl_type("func f(a: number) => a * 2", 0), "(a: number) => number");
        assert_eq!(
            decl_type("func f(a: string): string => a", 0),
            "(a: string) => string"
        );
        assert_eq!(decl_type("proc p(a: number) { }", 0), "(a: number) {}");
    }

    #[test]
    fn test_recursive_func_without_annotation() {
        let text = "func f(n: number) => if n < 1 { 0 } else { f(n - 1) }";
        assert_eq!(decl_type(text, 0), "(n: number) => unknown");
    }

    #[test]
    fn test_explicit_type_arguments() {
        let text = "func other<T>(a: T): T => a\nconst x = other<number>(12)";
        assert_eq!(last_decl_type(text), "number");
    }

    #[test]
    fn test_generic_binding_from_arguments() {
        let text = "func first<T>(xs: T[]): T | nil => xs[0]\nconst x = first([1, 2, 3])";
        assert_eq!(last_decl_type(text), "number | nil");
    }

    #[test]
    fn test_generics_preserved_or_erased() {
        let source = Source::new("func id<T extends string>(a: T): T => a");
        let analyzer = Analyzer::new(&NoImports);
        assert_eq!(
            analyzer.infer(&source.decl(0), true).to_string(),
            "<T extends string>(a: T) => T"
        );
        assert_eq!(
            analyzer.infer(&source.decl(0), false).to_string(),
            "(a: string) => string"
        );
    }

    #[test]
    fn test_callback_parameters_are_inferred_from_call() {
        let text = "func map<T, R>(xs: T[], f: (x: T) => R): R[] => nil\n\
                    const ys = map([1, 2], x => x + 1)";
        assert_eq!(last_decl_type(text), "number[]");

        let source = Source::new(text);
        let lambda_param = source.last("x +");
        assert_eq!(
            Analyzer::new(&NoImports).infer(&lambda_param, false),
            Type::Number
        );
    }

    #[test]
    fn test_annotated_const_types_func_literal() {
        let text = "const f: (a: string) => number = a => a.length";
        assert_eq!(decl_type(text, 0), "(a: string) => number");
        let source = Source::new(text);
        let param = source.last("a.length");
        assert_eq!(Analyzer::new(&NoImports).infer(&param, false), Type::String);
    }

    #[test]
    fn test_pipe_types_callback() {
        let text = "const x = 'abc' |> s => s.length";
        assert_eq!(decl_type(text, 0), "number");
    }

    #[test]
    fn test_optional_chaining() {
        let text = "type Obj = { foo: nil | { bar: number } }\n\
                    func fn(o: Obj) => o.foo?.bar";
        assert_eq!(last_decl_type(text), "(o: Obj) => number | nil");
    }

    #[test]
    fn test_indexers() {
        let text = "func f(a: {[string]: number}, b: [string, boolean], c: { k: nil }) => [a['x'], b[1], c['k']]";
        assert_eq!(
            decl_type(text, 0),
            "(a: {[string]: number}, b: [string, boolean], c: { k: nil }) => (number | nil | boolean)[]"
        );
    }

    #[test]
    fn test_if_and_switch_are_distilled() {
        assert_eq!(
            decl_type("func f(c: boolean) => if c { 1 } else if !c { 'a' }", 0),
            "(c: boolean) => 1 | 'a' | nil"
        );
        assert_eq!(
            decl_type("func f(n: number) => if n > 0 { n } else { 2 }", 0),
            "(n: number) => number"
        );
        assert_eq!(
            decl_type("func f(n: number) => switch n { case 1: 'one', default: 'many' }", 0),
            "(n: number) => 'one' | 'many'"
        );
    }

    #[test]
    fn test_empty_array_is_empty_tuple() {
        assert_eq!(decl_type("const a = []", 0), "[]");
        assert_eq!(decl_type("const a = [1, 1, 2]", 0), "(1 | 2)[]");
    }

    #[test]
    fn test_misc_expression_forms() {
        assert_eq!(decl_type("const a = (const b = 2, b * 3)", 0), "number");
        assert_eq!(decl_type("const a = 1..10", 0), "Iterator<number>");
        assert_eq!(decl_type("const a = 5 as number", 0), "number");
        assert_eq!(decl_type("const a = js# 1 + 1 #js", 0), "escape");
        assert_eq!(decl_type("const a = !3", 0), "boolean");
    }

    #[test]
    fn test_nominal_constructor_and_value() {
        let text = "nominal type Id(number)\nconst i = Id(5)\nconst v = i.value";
        assert_eq!(decl_type(text, 1), "Id");
        assert_eq!(decl_type(text, 2), "number");
    }

    #[test]
    fn test_store_members_and_this() {
        let text = "store Counter {\n\
                      public count = 0\n\
                      public func doubled() => this.count * 2\n\
                    }\n\
                    const c = Counter.count\n\
                    const d = Counter.doubled()";
        assert_eq!(decl_type(text, 1), "number");
        assert_eq!(decl_type(text, 2), "number");
    }

    #[test]
    fn test_chained_method_calls() {
        let text = format!(
            "func map<T, R>(xs: T[], f: (x: T) => R): R[] => []\n\
             func wrap<T>(x: T): {{ v: T }} => {{ v: x }}\n\
             const ys = [1, 2]{}.map(x => wrap(x))",
            ".map(x => x + 1)".repeat(20)
        );
        assert_eq!(last_decl_type(&text), "{ v: number }[]");
    }

    #[test]
    fn test_method_call_form() {
        let text = "func double(n: number) => n * 2\nconst x = 4\nconst y = x.double()";
        let source = Source::new(text);
        let analyzer = Analyzer::new(&NoImports);
        assert_eq!(analyzer.infer(&source.decl(2), false), Type::Number);

        let decl = source.decl(2);
        let NodeKind::ValueDeclaration { value, .. } = decl.kind() else {
            panic!("expected const");
        };
        let invocation = decl.child(*value);
        let target = analyzer.method_call_target(&invocation).unwrap();
        assert_eq!(target.declaration(), Some(&source.decl(0)));
    }

    #[test]
    fn test_for_loop_item() {
        let source = Source::new("proc p() { for i of 0..3 { log(i) } }");
        assert_eq!(
            Analyzer::new(&NoImports).infer(&source.at("i) }"), false),
            Type::Number
        );
    }

    #[test]
    fn test_module_alias_is_an_object() {
        let mut loader = TestLoader::default();
        loader.add("/util.bgl", "export func inc(n: number) => n + 1\nexport const zero = 0");
        let source = Source::new("import './util' as util\nconst one = util.inc(util.zero)");
        assert_eq!(
            Analyzer::new(&loader).infer(&source.decl(1), false),
            Type::Number
        );
    }
}

//! Name resolution by walking outward through enclosing scopes.
//!
//! There is no symbol table. A lookup starts at the referencing node and asks
//! each ancestor in turn whether it declares the name; the first scope that
//! does wins. Module and block scopes also compare the declaration's position
//! against the reference's to catch forward references.

use std::sync::Arc;

use bagel_ast::{Module, Node, NodeKind};

use crate::analyzer::Analyzer;
use crate::binding::{Binding, Namespace, ResolveError};
use crate::types::Type;

impl Analyzer<'_> {
    /// Resolve `name` as seen from `from`. Named type expressions look in the
    /// type namespace; everything else in the value namespace.
    pub fn resolve(&self, name: &str, from: &Node) -> Result<Binding, ResolveError> {
        let namespace = match from.kind() {
            NodeKind::NamedType { .. } => Namespace::Type,
            _ => Namespace::Value,
        };
        self.resolve_in(name, from, namespace)
    }

    pub(crate) fn resolve_in(
        &self,
        name: &str,
        from: &Node,
        namespace: Namespace,
    ) -> Result<Binding, ResolveError> {
        let mut child = from.clone();
        while let Some(scope) = child.parent() {
            if let Some(found) = self.lookup(&scope, &child, name, namespace) {
                if let Err(error) = &found {
                    tracing::trace!(name, ?error, "resolution failed");
                }
                return found;
            }
            child = scope;
        }
        tracing::trace!(name, ?namespace, "name not found");
        Err(ResolveError::CannotFindName)
    }

    /// What `scope` binds `name` to, for a reference inside its child `child`.
    fn lookup(
        &self,
        scope: &Node,
        child: &Node,
        name: &str,
        namespace: Namespace,
    ) -> Option<Result<Binding, ResolveError>> {
        match scope.kind() {
            NodeKind::Module { .. } => {
                for (index, decl) in scope.children().into_iter().enumerate() {
                    if let Some(found) = self.module_level(&decl, index, child, name, namespace) {
                        return Some(found);
                    }
                }
                None
            }
            NodeKind::Block(statements) => {
                if namespace != Namespace::Value {
                    return None;
                }
                statements.iter().enumerate().find_map(|(index, id)| {
                    let statement = scope.child(*id);
                    match statement.kind() {
                        NodeKind::DeclarationStatement { name: declared, .. } if declared == name => {
                            let binding = Binding::Basic {
                                declaration: statement.clone(),
                            };
                            Some(ordered(binding, index, child))
                        }
                        _ => None,
                    }
                })
            }
            NodeKind::Func {
                type_params,
                params,
                ..
            }
            | NodeKind::Proc {
                type_params,
                params,
                ..
            } => match namespace {
                Namespace::Type => self.generic_binding(scope, type_params, name),
                Namespace::Value => params.iter().enumerate().find_map(|(index, id)| {
                    match scope.child(*id).kind() {
                        NodeKind::Param { name: param, .. } if param == name => {
                            Some(Ok(Binding::Arg {
                                holder: scope.clone(),
                                index,
                            }))
                        }
                        _ => None,
                    }
                }),
            },
            NodeKind::TypeDeclaration { type_params, .. }
            | NodeKind::FuncType { type_params, .. }
            | NodeKind::ProcType { type_params, .. }
                if namespace == Namespace::Type =>
            {
                self.generic_binding(scope, type_params, name)
            }
            NodeKind::ForLoop { item, body, .. }
                if namespace == Namespace::Value && item == name && child.id() == *body =>
            {
                Some(Ok(Binding::Iterator {
                    for_loop: scope.clone(),
                }))
            }
            NodeKind::InlineConst {
                name: declared,
                value,
                body,
                ..
            } if namespace == Namespace::Value && declared == name => {
                let binding = Binding::Basic {
                    declaration: scope.clone(),
                };
                if child.id() == *value {
                    Some(Err(ResolveError::UsedInOwnInitializer(binding)))
                } else if child.id() == *body {
                    Some(Ok(binding))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn module_level(
        &self,
        decl: &Node,
        index: usize,
        child: &Node,
        name: &str,
        namespace: Namespace,
    ) -> Option<Result<Binding, ResolveError>> {
        match decl.kind() {
            NodeKind::ImportDeclaration { path, items } => items.iter().find_map(|id| {
                match decl.child(*id).kind() {
                    NodeKind::ImportItem {
                        name: imported,
                        alias,
                    } if alias.as_deref().unwrap_or(imported) == name => {
                        self.resolve_import(decl, path, imported, namespace)
                    }
                    _ => None,
                }
            }),
            NodeKind::ImportAllDeclaration { alias, .. }
                if namespace == Namespace::Value && alias == name =>
            {
                Some(Ok(Binding::Module {
                    import: decl.clone(),
                }))
            }
            NodeKind::ValueDeclaration { .. } => {
                let binding = self.declared(decl, name, namespace)?;
                Some(ordered(binding, index, child))
            }
            _ => self.declared(decl, name, namespace).map(Ok),
        }
    }

    /// The binding a top-level declaration introduces for `name`, if any.
    /// Imports and declaration order are not considered here.
    pub(crate) fn declared(&self, decl: &Node, name: &str, namespace: Namespace) -> Option<Binding> {
        let basic = || Binding::Basic {
            declaration: decl.clone(),
        };
        match (decl.kind(), namespace) {
            (
                NodeKind::FuncDeclaration { name: declared, .. }
                | NodeKind::ProcDeclaration { name: declared, .. }
                | NodeKind::ValueDeclaration { name: declared, .. },
                Namespace::Value,
            ) if declared == name => Some(basic()),
            (
                NodeKind::TypeDeclaration {
                    name: declared,
                    nominal: true,
                    ..
                },
                Namespace::Value,
            ) if declared == name => Some(basic()),
            (
                NodeKind::TypeDeclaration {
                    name: declared,
                    type_params,
                    value,
                    nominal,
                    ..
                },
                Namespace::Type,
            ) if declared == name => {
                let inner = self.lower(&decl.child(*value));
                let ty = if *nominal {
                    Type::Nominal {
                        name: declared.clone(),
                        inner: Box::new(inner),
                    }
                } else {
                    inner
                };
                Some(Binding::Type {
                    ty,
                    params: self.type_params(decl, type_params),
                })
            }
            (NodeKind::StoreDeclaration { name: declared, .. }, Namespace::Value)
                if declared == name =>
            {
                Some(basic())
            }
            (NodeKind::StoreDeclaration { name: declared, .. }, Namespace::Type)
                if declared == name =>
            {
                Some(Binding::Type {
                    ty: Type::Store {
                        name: declared.clone(),
                        declaration: decl.clone(),
                    },
                    params: Vec::new(),
                })
            }
            _ => None,
        }
    }

    fn generic_binding(
        &self,
        scope: &Node,
        type_params: &[bagel_ast::NodeId],
        name: &str,
    ) -> Option<Result<Binding, ResolveError>> {
        type_params.iter().find_map(|id| {
            let param = scope.child(*id);
            match param.kind() {
                NodeKind::GenericParam { name: declared, .. } if declared == name => {
                    Some(Ok(Binding::Type {
                        ty: self.generic_type(&param),
                        params: Vec::new(),
                    }))
                }
                _ => None,
            }
        })
    }

    /// `None` when the target module only exports `name` in the other
    /// namespace, so that the search continues outward.
    fn resolve_import(
        &self,
        import: &Node,
        path: &str,
        name: &str,
        namespace: Namespace,
    ) -> Option<Result<Binding, ResolveError>> {
        let Some(target) = self.load(import, path) else {
            return Some(Err(ResolveError::CannotFindModule {
                import: import.clone(),
                path: path.to_string(),
            }));
        };
        if let Some(binding) = self.find_export(&target, name, namespace) {
            return Some(Ok(binding));
        }
        if self.find_export(&target, name, other(namespace)).is_some() {
            return None;
        }
        Some(Err(ResolveError::CannotFindExport {
            import: import.clone(),
            path: path.to_string(),
            name: name.to_string(),
        }))
    }

    pub(crate) fn load(&self, import: &Node, path: &str) -> Option<Arc<Module>> {
        let module = self.loader.get_module_by_name(import.module(), path);
        if module.is_none() {
            tracing::debug!(from = %import.module().path().display(), path, "module not found");
        }
        module
    }

    /// An exported top-level declaration of `module` named `name`.
    pub(crate) fn find_export(
        &self,
        module: &Arc<Module>,
        name: &str,
        namespace: Namespace,
    ) -> Option<Binding> {
        module
            .declarations()
            .into_iter()
            .filter(is_exported)
            .find_map(|decl| self.declared(&decl, name, namespace))
    }
}

pub(crate) fn is_exported(decl: &Node) -> bool {
    matches!(
        decl.kind(),
        NodeKind::TypeDeclaration { exported: true, .. }
            | NodeKind::FuncDeclaration { exported: true, .. }
            | NodeKind::ProcDeclaration { exported: true, .. }
            | NodeKind::ValueDeclaration { exported: true, .. }
            | NodeKind::StoreDeclaration { exported: true, .. }
    )
}

fn other(namespace: Namespace) -> Namespace {
    match namespace {
        Namespace::Value => Namespace::Type,
        Namespace::Type => Namespace::Value,
    }
}

/// Apply the forward-reference rule: `child` is the sibling holding the
/// reference, `declared_at` the sibling index of the declaration.
fn ordered(binding: Binding, declared_at: usize, child: &Node) -> Result<Binding, ResolveError> {
    match child.sibling_index() {
        Some(used_at) if used_at < declared_at => {
            Err(ResolveError::UsedBeforeInitialization(binding))
        }
        Some(used_at) if used_at == declared_at => Err(ResolveError::UsedInOwnInitializer(binding)),
        _ => Ok(binding),
    }
}

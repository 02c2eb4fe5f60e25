//! What a name refers to.

use bagel_ast::Node;

use crate::types::{Type, TypeParam};

/// The two namespaces a name can live in. Stores and nominal types occupy
/// both.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    Value,
    Type,
}

/// The target of a successful lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// A func, proc, const/let, inline const, store, or nominal type
    /// (as its constructor).
    Basic { declaration: Node },
    /// Parameter `index` of the func or proc `holder`.
    Arg { holder: Node, index: usize },
    /// A type name. `params` are the alias's own type parameters, to be
    /// bound by `Name<Args>`.
    Type { ty: Type, params: Vec<TypeParam> },
    /// A whole-module import alias.
    Module { import: Node },
    /// The item of a for loop.
    Iterator { for_loop: Node },
}

/// Why a lookup failed. The forward-reference variants still carry the
/// binding that was found.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveError {
    CannotFindName,
    CannotFindModule { import: Node, path: String },
    CannotFindExport { import: Node, path: String, name: String },
    UsedBeforeInitialization(Binding),
    UsedInOwnInitializer(Binding),
}

impl Binding {
    /// The declaring node, when there is one.
    pub fn declaration(&self) -> Option<&Node> {
        match self {
            Binding::Basic { declaration } => Some(declaration),
            Binding::Arg { holder, .. } => Some(holder),
            Binding::Module { import } => Some(import),
            Binding::Iterator { for_loop } => Some(for_loop),
            Binding::Type { .. } => None,
        }
    }
}

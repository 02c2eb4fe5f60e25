//! Static analysis for Bagel: name resolution, type inference, subsumption
//! and the checking pass that turns them into diagnostics.
//!
//! Everything here is a pure function of the AST plus a [`ModuleLoader`] for
//! imports. Each entry point builds a fresh [`Analyzer`], whose recursion
//! guards live only for the duration of the call; memoizing results across
//! calls is left to the caller.

mod analyzer;
mod binding;
mod check;
mod error;
mod infer;
mod loader;
mod lower;
mod operators;
mod resolve;
mod subsume;
#[cfg(test)]
mod test_support;
mod types;

use std::sync::Arc;

use bagel_ast::{Module, Node};

pub use analyzer::Analyzer;
pub use binding::{Binding, Namespace, ResolveError};
pub use error::{BagelError, Problem};
pub use loader::{ModuleLoader, NoImports};
pub use types::{FuncArg, ObjectEntry, Origin, Type, TypeParam};

/// What `name`, written at `from`, refers to.
pub fn resolve_binding(
    loader: &dyn ModuleLoader,
    name: &str,
    from: &Node,
) -> Result<Binding, ResolveError> {
    Analyzer::new(loader).resolve(name, from)
}

/// The type of an expression, declaration or type expression.
pub fn infer_type(loader: &dyn ModuleLoader, node: &Node, preserve_generics: bool) -> Type {
    Analyzer::new(loader).infer(node, preserve_generics)
}

/// Whether every value of `value` is also a value of `destination`.
pub fn subsumes(
    loader: &dyn ModuleLoader,
    destination: &Type,
    value: &Type,
    resolve_generics: bool,
) -> bool {
    Analyzer::new(loader).subsumes(destination, value, resolve_generics)
}

/// `ty` without the union members that `removed` subsumes.
pub fn subtract(loader: &dyn ModuleLoader, ty: &Type, removed: &Type) -> Type {
    Analyzer::new(loader).subtract(ty, removed)
}

/// Check a whole module, reporting each error in source order.
pub fn typecheck(loader: &dyn ModuleLoader, module: &Arc<Module>, report: &mut dyn FnMut(BagelError)) {
    Analyzer::new(loader).typecheck(module, report)
}

/// For `a.f(b)` where `f` is not a property of `a`, the function in scope
/// that the call is rewritten to as `f(a, b)`.
pub fn method_call_target(loader: &dyn ModuleLoader, invocation: &Node) -> Option<Binding> {
    Analyzer::new(loader).method_call_target(invocation)
}

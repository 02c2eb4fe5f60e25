use std::cell::{Cell, RefCell};

use bagel_ast::Node;

use crate::ModuleLoader;
use crate::types::Type;

/// Comparisons nested deeper than this are answered `false`.
pub(crate) const MAX_SUBSUMPTION_DEPTH: usize = 64;

/// Shared state of one entry-point call into the checker.
///
/// Holds no results between calls; the only state is the recursion guards
/// and the expectations of calls being bound, all empty again whenever an
/// entry point returns.
pub struct Analyzer<'a> {
    pub(crate) loader: &'a dyn ModuleLoader,
    /// Nodes whose type is being inferred right now.
    in_progress: RefCell<Vec<Node>>,
    /// Named-type comparisons under way; revisiting one assumes it holds.
    pub(crate) comparing: RefCell<Vec<(Type, Type)>>,
    pub(crate) depth: Cell<usize>,
    /// Call arguments whose expected type is already known because their
    /// call is binding its type parameters right now.
    expectations: RefCell<Vec<(Node, Type)>>,
}

impl<'a> Analyzer<'a> {
    pub fn new(loader: &'a dyn ModuleLoader) -> Self {
        Self {
            loader,
            in_progress: RefCell::new(Vec::new()),
            comparing: RefCell::new(Vec::new()),
            depth: Cell::new(0),
            expectations: RefCell::new(Vec::new()),
        }
    }

    /// Run `f` unless `node` is already being processed, in which case
    /// `fallback` is returned.
    pub(crate) fn guarded<T>(&self, node: &Node, fallback: T, f: impl FnOnce() -> T) -> T {
        if self.in_progress.borrow().contains(node) {
            tracing::trace!(?node, "recursive inference cut off");
            return fallback;
        }
        self.in_progress.borrow_mut().push(node.clone());
        let result = f();
        self.in_progress.borrow_mut().pop();
        result
    }

    /// Run `f` with `expected` recorded as the type the context of `node`
    /// requires.
    pub(crate) fn expecting<T>(&self, node: &Node, expected: Type, f: impl FnOnce() -> T) -> T {
        self.expectations.borrow_mut().push((node.clone(), expected));
        let result = f();
        self.expectations.borrow_mut().pop();
        result
    }

    pub(crate) fn recorded_expectation(&self, node: &Node) -> Option<Type> {
        self.expectations
            .borrow()
            .iter()
            .rev()
            .find(|(pending, _)| pending == node)
            .map(|(_, ty)| ty.clone())
    }
}

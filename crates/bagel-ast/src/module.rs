//! Arena-backed module and the `Node` handle used to walk it.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bagel_core::Span;

use super::{NodeId, NodeKind, SpanMap, SpanMapBuilder};

#[derive(Clone, Debug, PartialEq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
}

/// One parsed source file.
///
/// Nodes are stored in allocation order; parent links are filled in once the
/// whole tree is built and never change afterwards.
#[derive(Debug, PartialEq)]
pub struct Module {
    path: PathBuf,
    nodes: Vec<NodeData>,
    spans: SpanMap,
    root: NodeId,
}

impl Module {
    /// A module with no declarations, used in place of a file that failed to parse.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        let mut builder = ModuleBuilder::new(path);
        let root = builder.alloc(
            NodeKind::Module {
                declarations: Vec::new(),
            },
            Span::default(),
        );
        builder.finish(root)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans.get_or_default(id)
    }

    pub fn spans(&self) -> &SpanMap {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` names a node of this module.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn root_node(self: &Arc<Self>) -> Node {
        self.node(self.root)
    }

    pub fn node(self: &Arc<Self>, id: NodeId) -> Node {
        Node {
            module: self.clone(),
            id,
        }
    }

    /// Top-level declarations in source order.
    pub fn declarations(self: &Arc<Self>) -> Vec<Node> {
        self.root_node().children()
    }

    /// Innermost node whose span contains `offset`.
    pub fn node_at(self: &Arc<Self>, offset: usize) -> Node {
        let mut current = self.root_node();
        'descend: loop {
            for child in current.children() {
                let span = child.span();
                if span.start <= offset && offset < span.end {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }
}

/// A node together with the module that owns it.
///
/// Cheap to clone. Two handles are equal when they point at the same node of
/// the same module path.
#[derive(Clone)]
pub struct Node {
    module: Arc<Module>,
    id: NodeId,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn kind(&self) -> &NodeKind {
        self.module.kind(self.id)
    }

    pub fn span(&self) -> Span {
        self.module.span(self.id)
    }

    pub fn parent(&self) -> Option<Node> {
        self.module.parent(self.id).map(|id| self.child(id))
    }

    /// Another node of the same module.
    pub fn child(&self, id: NodeId) -> Node {
        Node {
            module: self.module.clone(),
            id,
        }
    }

    pub fn children(&self) -> Vec<Node> {
        self.kind()
            .children()
            .into_iter()
            .map(|id| self.child(id))
            .collect()
    }

    /// Proper ancestors, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = Node> + '_ {
        std::iter::successors(self.parent(), Node::parent)
    }

    /// Position of this node among its parent's children.
    pub fn sibling_index(&self) -> Option<usize> {
        let parent = self.parent()?;
        parent.kind().children().iter().position(|id| *id == self.id)
    }

    /// The ancestor-or-self that is a direct child of `ancestor`.
    pub fn child_of(&self, ancestor: &Node) -> Option<Node> {
        let mut current = self.clone();
        loop {
            let parent = current.parent()?;
            if &parent == ancestor {
                return Some(current);
            }
            current = parent;
        }
    }

    pub fn is_descendant_of(&self, ancestor: &Node) -> bool {
        self.ancestors().any(|node| &node == ancestor)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && (Arc::ptr_eq(&self.module, &other.module) || self.module.path == other.module.path)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.module.path.hash(state);
        self.id.hash(state);
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}({})",
            self.module.path.display(),
            self.id,
            self.kind().name()
        )
    }
}

/// Incrementally allocates nodes; used by the parser.
#[derive(Debug)]
pub struct ModuleBuilder {
    path: PathBuf,
    nodes: Vec<NodeData>,
    spans: SpanMapBuilder,
}

impl ModuleBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            nodes: Vec::new(),
            spans: SpanMapBuilder::new(),
        }
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData { kind, parent: None });
        self.spans.insert(id, span);
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node allocated after the first `len`; used when the parser
    /// backtracks.
    pub fn truncate(&mut self, len: usize) {
        self.nodes.truncate(len);
        self.spans.truncate(len);
    }

    /// Link every node to its parent and freeze the arena.
    pub fn finish(mut self, root: NodeId) -> Module {
        for index in 0..self.nodes.len() {
            for child in self.nodes[index].kind.children() {
                self.nodes[child.index()].parent = Some(NodeId::new(index));
            }
        }
        Module {
            path: self.path,
            nodes: self.nodes,
            spans: self.spans.finish(),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<Module> {
        let mut builder = ModuleBuilder::new("/a.bgl");
        let one = builder.alloc(NodeKind::NumberLiteral(1.0), Span::new(10, 11));
        let two = builder.alloc(NodeKind::NumberLiteral(2.0), Span::new(14, 15));
        let sum = builder.alloc(
            NodeKind::BinaryOperation {
                left: one,
                op: crate::BinaryOp::Add,
                right: two,
            },
            Span::new(10, 15),
        );
        let decl = builder.alloc(
            NodeKind::ValueDeclaration {
                name: "a".into(),
                type_annotation: None,
                value: sum,
                is_const: true,
                exported: false,
            },
            Span::new(0, 15),
        );
        let root = builder.alloc(
            NodeKind::Module {
                declarations: vec![decl],
            },
            Span::new(0, 15),
        );
        Arc::new(builder.finish(root))
    }

    #[test]
    fn test_parent_links() {
        let module = sample();
        let decl = &module.declarations()[0];
        let sum = &decl.children()[0];
        assert_eq!(sum.parent().as_ref(), Some(decl));
        assert_eq!(decl.parent(), Some(module.root_node()));
        assert_eq!(module.root_node().parent(), None);
    }

    #[test]
    fn test_ancestors_innermost_first() {
        let module = sample();
        let one = module.node(NodeId::from_raw(0));
        let kinds: Vec<_> = one.ancestors().map(|n| n.kind().name()).collect();
        assert_eq!(kinds, ["binary-operation", "value-declaration", "module"]);
    }

    #[test]
    fn test_sibling_index_and_child_of() {
        let module = sample();
        let two = module.node(NodeId::from_raw(1));
        assert_eq!(two.sibling_index(), Some(1));
        let decl = &module.declarations()[0];
        assert_eq!(two.child_of(&module.root_node()).as_ref(), Some(decl));
        assert!(two.is_descendant_of(decl));
    }

    #[test]
    fn test_node_at_finds_innermost() {
        let module = sample();
        assert_eq!(module.node_at(14).kind(), &NodeKind::NumberLiteral(2.0));
        assert_eq!(module.node_at(12).kind().name(), "binary-operation");
    }

    #[test]
    fn test_empty_module() {
        let module = Arc::new(Module::empty("/broken.bgl"));
        assert!(module.declarations().is_empty());
        assert_eq!(module.len(), 1);
    }
}

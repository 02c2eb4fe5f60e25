//! SpanMap for tracking AST node source locations.
//!
//! AST nodes don't store spans directly. Each node has a `NodeId` that is
//! used to look up its span in a separate `SpanMap`, keeping the node kinds
//! purely structural.

use std::collections::HashMap;
use std::sync::Arc;

use bagel_core::Span;

use super::NodeId;

/// Builder for constructing a SpanMap while parsing.
#[derive(Debug, Default)]
pub struct SpanMapBuilder {
    spans: HashMap<NodeId, Span>,
}

impl SpanMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: NodeId, span: Span) {
        self.spans.insert(id, span);
    }

    /// Forget the spans of every node whose index is `len` or above.
    pub fn truncate(&mut self, len: usize) {
        self.spans.retain(|id, _| id.index() < len);
    }

    pub fn finish(self) -> SpanMap {
        SpanMap(Arc::new(self.spans))
    }
}

/// NodeId → Span mapping.
///
/// Uses `Arc<HashMap>` internally for cheap cloning. Immutable once built.
#[derive(Clone, Debug)]
pub struct SpanMap(Arc<HashMap<NodeId, Span>>);

impl PartialEq for SpanMap {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SpanMap {}

impl SpanMap {
    pub fn get(&self, id: NodeId) -> Option<Span> {
        self.0.get(&id).copied()
    }

    /// Look up a span by NodeId, returning an empty span if not found.
    pub fn get_or_default(&self, id: NodeId) -> Span {
        self.get(id).unwrap_or_default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains_key(&id)
    }
}

impl Default for SpanMap {
    fn default() -> Self {
        Self(Arc::new(HashMap::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_map_builder() {
        let mut builder = SpanMapBuilder::new();
        let id1 = NodeId::from_raw(0);
        let id2 = NodeId::from_raw(1);

        builder.insert(id1, Span::new(10, 20));
        builder.insert(id2, Span::new(30, 40));

        let span_map = builder.finish();

        assert_eq!(span_map.get(id1), Some(Span::new(10, 20)));
        assert_eq!(span_map.get(id2), Some(Span::new(30, 40)));
        assert_eq!(span_map.get(NodeId::from_raw(999)), None);
        assert!(span_map.contains(id1));
    }

    #[test]
    fn test_span_map_get_or_default() {
        let mut builder = SpanMapBuilder::new();
        builder.insert(NodeId::from_raw(0), Span::new(10, 20));
        let span_map = builder.finish();

        assert_eq!(span_map.get_or_default(NodeId::from_raw(0)), Span::new(10, 20));
        assert_eq!(
            span_map.get_or_default(NodeId::from_raw(999)),
            Span::new(0, 0)
        );
    }

    #[test]
    fn test_span_map_clones_compare_equal() {
        let mut builder = SpanMapBuilder::new();
        builder.insert(NodeId::from_raw(0), Span::new(10, 20));
        let span_map = builder.finish();
        assert_eq!(span_map.clone(), span_map);
    }
}

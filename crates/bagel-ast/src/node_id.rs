//! Node ID for AST nodes.
//!
//! Each AST node has a unique NodeId that can be used to look up
//! additional information (spans, types, etc.) in separate tables.
//! This follows the rust-analyzer pattern of separating structure from metadata.

/// Unique identifier for an AST node within a module.
///
/// The value is the node's index in its module's arena, so ids are dense
/// and assigned in allocation order. NodeIds are local to a module and
/// must be paired with the module (see [`crate::Node`]) to cross module
/// boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, salsa::Update)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the node in its module's arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Get the raw value of this NodeId.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Create a NodeId from a raw value.
    ///
    /// Ids obtained this way are only meaningful for the module that
    /// produced the raw value.
    pub const fn from_raw(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_from_raw() {
        let id = NodeId::from_raw(12345);
        assert_eq!(id.raw(), 12345);
        assert_eq!(id.index(), 12345);
    }

    #[test]
    fn test_node_id_display() {
        let id = NodeId::from_raw(123);
        assert_eq!(format!("{}", id), "#123");
    }
}

//! Reverse lookup from transform nodes to the objects that own them
//!
//! Node handles are only unique within one object's arena, so every node is
//! also registered here under a scene-wide [`NodeKey`]. Objects register
//! their nodes on construction and unregister them on destruction; the
//! registry is passed in explicitly rather than living in a global.

use crate::foundation::collections::{NodeId, NodeKey, ObjectId, SlotMap};

/// Object and arena node behind a [`NodeKey`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeOwner {
    /// Owning object
    pub object: ObjectId,
    /// Node inside that object's transform tree
    pub node: NodeId,
}

/// Scene-wide node → object table
#[derive(Debug, Default)]
pub struct NodeRegistry {
    owners: SlotMap<NodeKey, NodeOwner>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `node` belongs to `object`
    pub fn register(&mut self, object: ObjectId, node: NodeId) -> NodeKey {
        self.owners.insert(NodeOwner { object, node })
    }

    /// Drop a registration; unknown keys are ignored
    pub fn unregister(&mut self, key: NodeKey) -> Option<NodeOwner> {
        self.owners.remove(key)
    }

    /// Owner of a registered node
    pub fn owner_of(&self, key: NodeKey) -> Option<NodeOwner> {
        self.owners.get(key).copied()
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Number of nodes registered for `object`
    pub fn count_for(&self, object: ObjectId) -> usize {
        self.owners.values().filter(|owner| owner.object == object).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    #[test]
    fn test_register_and_unregister() {
        let object = ObjectId::from(KeyData::from_ffi(1));
        let node = NodeId::from(KeyData::from_ffi(2));

        let mut registry = NodeRegistry::new();
        let key = registry.register(object, node);
        assert_eq!(registry.owner_of(key), Some(NodeOwner { object, node }));
        assert_eq!(registry.count_for(object), 1);

        assert!(registry.unregister(key).is_some());
        assert!(registry.owner_of(key).is_none());
        assert!(registry.unregister(key).is_none());
        assert!(registry.is_empty());
    }
}

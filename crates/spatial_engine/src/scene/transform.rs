//! Transform hierarchy
//!
//! Nodes live in a per-object arena and refer to each other by [`NodeId`].
//! Each node caches its world matrix behind a dirty flag and a world-space
//! bounding box covering itself and all of its descendants.
//!
//! World matrices resolve lazily through `&self`, so draw traversal can query
//! them without exclusive access. Bounding boxes are written by
//! [`TransformTree::calculate_hierarchical_aabb`] and only read afterwards.

use std::cell::Cell;

use crate::foundation::collections::{NodeId, SlotMap};
use crate::foundation::math::{translation_of, LocalTransform, Mat4, Quat, Vec3};
use crate::scene::{Aabb, SceneError, SceneResult};

/// Half extent of the box given to subtrees without any geometry
pub const DEFAULT_FALLBACK_HALF_EXTENT: f32 = 0.1;

/// A single node of a [`TransformTree`]
#[derive(Debug, Clone)]
pub struct TransformNode {
    /// Debug name, usually the imported node name
    pub name: String,
    local: LocalTransform,
    local_aabb: Aabb,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Cell<Mat4>,
    dirty: Cell<bool>,
    world_aabb: Aabb,
}

impl TransformNode {
    fn new(name: String, local: LocalTransform) -> Self {
        Self {
            name,
            local,
            local_aabb: Aabb::new(Vec3::zeros(), Vec3::zeros()),
            parent: None,
            children: Vec::new(),
            world: Cell::new(Mat4::identity()),
            dirty: Cell::new(true),
            world_aabb: Aabb::new(Vec3::zeros(), Vec3::zeros()),
        }
    }

    /// Local translation / rotation / scale
    pub fn local(&self) -> &LocalTransform {
        &self.local
    }

    /// Local-space geometry bounds; `min == max` means no geometry
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether the cached world matrix is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Last computed hierarchical bounds
    pub fn world_aabb(&self) -> Aabb {
        self.world_aabb
    }
}

/// Arena-backed transform hierarchy
#[derive(Debug, Clone)]
pub struct TransformTree {
    nodes: SlotMap<NodeId, TransformNode>,
    fallback_half_extent: f32,
}

impl Default for TransformTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            fallback_half_extent: DEFAULT_FALLBACK_HALF_EXTENT,
        }
    }

    /// Builder: half extent of the box used when a subtree has no geometry
    pub fn with_fallback_half_extent(mut self, half_extent: f32) -> Self {
        self.fallback_half_extent = half_extent;
        self
    }

    /// Insert a detached node
    pub fn insert(&mut self, name: impl Into<String>, local: LocalTransform) -> NodeId {
        self.nodes.insert(TransformNode::new(name.into(), local))
    }

    /// Insert a node directly under `parent`
    pub fn insert_child(&mut self, parent: NodeId, name: impl Into<String>, local: LocalTransform) -> SceneResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound);
        }
        let child = self.insert(name, local);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Free a node together with all of its descendants
    pub fn remove_subtree(&mut self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.detach(parent, id);
        }

        let removed = self.descendants(id)?;
        for node in &removed {
            self.nodes.remove(*node);
        }
        Ok(removed)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is a live node of this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> SceneResult<&TransformNode> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound)
    }

    fn node_mut(&mut self, id: NodeId) -> SceneResult<&mut TransformNode> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound)
    }

    /// Iterate over all nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TransformNode)> {
        self.nodes.iter()
    }

    /// `id` followed by every descendant, depth-first pre-order
    pub fn descendants(&self, id: NodeId) -> SceneResult<Vec<NodeId>> {
        self.node(id)?;
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        Ok(out)
    }

    /// Replace the local translation
    pub fn set_position(&mut self, id: NodeId, position: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.local.position = position;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace the local scale
    pub fn set_scale(&mut self, id: NodeId, scale: Vec3) -> SceneResult<()> {
        self.node_mut(id)?.local.scale = scale;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace the local rotation
    pub fn set_rotation(&mut self, id: NodeId, rotation: Quat) -> SceneResult<()> {
        self.node_mut(id)?.local.rotation = rotation;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace the whole local transform
    pub fn set_local(&mut self, id: NodeId, local: LocalTransform) -> SceneResult<()> {
        self.node_mut(id)?.local = local;
        self.mark_dirty(id);
        Ok(())
    }

    /// Replace the local-space geometry bounds
    pub fn set_local_aabb(&mut self, id: NodeId, aabb: Aabb) -> SceneResult<()> {
        self.node_mut(id)?.local_aabb = aabb;
        Ok(())
    }

    /// Parent of `id`
    pub fn parent(&self, id: NodeId) -> SceneResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Children of `id` in insertion order
    pub fn children(&self, id: NodeId) -> SceneResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Attach `child` under `parent`, detaching it from its previous parent
    /// first. Attaching a node under itself or one of its descendants fails
    /// with [`SceneError::HierarchyCycle`].
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(parent)?;
        let previous = self.node(child)?.parent;

        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::HierarchyCycle);
        }

        if let Some(previous) = previous {
            self.detach(previous, child);
        }

        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        self.mark_dirty(child);
        Ok(())
    }

    /// Detach `child` from `parent`; a no-op when it is not attached there
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> SceneResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent == Some(parent) {
            self.detach(parent, child);
            self.mark_dirty(child);
        }
        Ok(())
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|c| *c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
    }

    /// True if `ancestor` is `node` or lies on its parent chain
    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    /// Flag `id` and its entire subtree for world-matrix recomputation
    pub fn mark_dirty(&self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                node.dirty.set(true);
                stack.extend_from_slice(&node.children);
            }
        }
    }

    /// World matrix of `id`, recomputed through the parent chain if dirty
    pub fn world_matrix(&self, id: NodeId) -> SceneResult<Mat4> {
        self.resolve_world(id).ok_or(SceneError::NodeNotFound)
    }

    fn resolve_world(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        if !node.dirty.get() {
            return Some(node.world.get());
        }

        let local = node.local.to_matrix();
        let world = match node.parent {
            Some(parent) => self.resolve_world(parent)? * local,
            None => local,
        };

        node.world.set(world);
        node.dirty.set(false);
        Some(world)
    }

    /// Bring every cached world matrix up to date
    pub fn update_world_matrices(&self) {
        for (id, _) in self.nodes.iter() {
            self.resolve_world(id);
        }
    }

    /// Recompute hierarchical bounds for `id` and its subtree, bottom-up.
    ///
    /// A node contributes its transformed local box unless that box is
    /// degenerate; children fold in after their own recomputation. A subtree
    /// with nothing to contribute gets a small cube around the node's world
    /// origin.
    pub fn calculate_hierarchical_aabb(&mut self, id: NodeId) -> SceneResult<Aabb> {
        let world = self.world_matrix(id)?;
        let node = self.node(id)?;

        let mut bounds = if node.local_aabb.is_degenerate() {
            None
        } else {
            Some(node.local_aabb.transformed(&world))
        };

        let children = node.children.clone();
        for child in children {
            let child_bounds = self.calculate_hierarchical_aabb(child)?;
            if child_bounds.is_valid() {
                bounds = Some(match bounds {
                    Some(current) => current.union(&child_bounds),
                    None => child_bounds,
                });
            }
        }

        let bounds = bounds.unwrap_or_else(|| Aabb::cube(translation_of(&world), self.fallback_half_extent));
        self.node_mut(id)?.world_aabb = bounds;
        Ok(bounds)
    }

    /// Matrix refresh followed by bounds recomputation for the subtree at `root`
    pub fn refresh(&mut self, root: NodeId) -> SceneResult<Aabb> {
        self.update_world_matrices();
        self.calculate_hierarchical_aabb(root)
    }

    /// Last computed hierarchical bounds of `id`; never recomputes
    pub fn world_aabb(&self, id: NodeId) -> SceneResult<Aabb> {
        Ok(self.node(id)?.world_aabb)
    }

    /// Minimum corner of the last computed hierarchical bounds
    pub fn world_aabb_min(&self, id: NodeId) -> SceneResult<Vec3> {
        Ok(self.node(id)?.world_aabb.min)
    }

    /// Maximum corner of the last computed hierarchical bounds
    pub fn world_aabb_max(&self, id: NodeId) -> SceneResult<Vec3> {
        Ok(self.node(id)?.world_aabb.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Point3};
    use approx::assert_relative_eq;

    fn chain() -> (TransformTree, NodeId, NodeId, NodeId) {
        let mut tree = TransformTree::new();
        let root = tree.insert("root", LocalTransform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        let child = tree
            .insert_child(
                root,
                "child",
                LocalTransform::from_position(Vec3::new(2.0, 0.0, 0.0))
                    .with_rotation(Quat::from_axis_angle(&Vec3::y_axis(), constants::PI / 2.0)),
            )
            .expect("child");
        let grandchild = tree
            .insert_child(
                child,
                "grandchild",
                LocalTransform::from_position(Vec3::new(0.0, 0.0, 3.0)).with_scale(Vec3::repeat(2.0)),
            )
            .expect("grandchild");
        (tree, root, child, grandchild)
    }

    #[test]
    fn test_world_is_parent_times_local() {
        let (tree, _, child, grandchild) = chain();
        let parent_world = tree.world_matrix(child).expect("child world");
        let local = tree.node(grandchild).expect("node").local().to_matrix();
        let world = tree.world_matrix(grandchild).expect("grandchild world");
        assert_relative_eq!(world, parent_world * local, epsilon = 1e-6);
    }

    #[test]
    fn test_root_uses_local_matrix() {
        let (tree, root, _, _) = chain();
        let expected = tree.node(root).expect("root").local().to_matrix();
        assert_eq!(tree.world_matrix(root).expect("root world"), expected);
    }

    #[test]
    fn test_cache_is_bit_identical() {
        let (tree, _, _, grandchild) = chain();
        let first = tree.world_matrix(grandchild).expect("first");
        assert!(!tree.node(grandchild).expect("node").is_dirty());
        let second = tree.world_matrix(grandchild).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn test_moving_root_moves_grandchild() {
        let (mut tree, root, _, grandchild) = chain();
        let before = translation_of(&tree.world_matrix(grandchild).expect("before"));

        tree.set_position(root, Vec3::new(1.0, 1.0, 0.0)).expect("move root");
        assert!(tree.node(grandchild).expect("node").is_dirty());

        let after = translation_of(&tree.world_matrix(grandchild).expect("after"));
        assert_relative_eq!(after - before, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_rotation_and_scale_propagate() {
        let (mut tree, _, child, grandchild) = chain();
        tree.world_matrix(grandchild).expect("warm cache");

        tree.set_rotation(child, Quat::identity()).expect("rotate");
        let p = translation_of(&tree.world_matrix(grandchild).expect("after rotate"));
        assert_relative_eq!(p, Vec3::new(2.0, 1.0, 3.0), epsilon = 1e-5);

        tree.set_scale(child, Vec3::repeat(2.0)).expect("scale");
        let p = translation_of(&tree.world_matrix(grandchild).expect("after scale"));
        assert_relative_eq!(p, Vec3::new(2.0, 1.0, 6.0), epsilon = 1e-5);
    }

    #[test]
    fn test_reparent_detaches_and_dirties() {
        let (mut tree, root, child, grandchild) = chain();
        tree.world_matrix(grandchild).expect("warm cache");

        tree.add_child(root, grandchild).expect("reparent");
        assert!(tree.children(child).expect("child").is_empty());
        assert_eq!(tree.parent(grandchild).expect("parent"), Some(root));
        assert_eq!(tree.children(root).expect("root"), &[child, grandchild]);

        let p = translation_of(&tree.world_matrix(grandchild).expect("world"));
        assert_relative_eq!(p, Vec3::new(0.0, 1.0, 3.0), epsilon = 1e-5);
    }

    #[test]
    fn test_remove_child_makes_root() {
        let (mut tree, root, child, _) = chain();
        tree.remove_child(root, child).expect("remove");
        assert_eq!(tree.parent(child).expect("parent"), None);
        assert_relative_eq!(translation_of(&tree.world_matrix(child).expect("world")), Vec3::new(2.0, 0.0, 0.0));

        // Not attached any more: no-op.
        tree.remove_child(root, child).expect("second remove");
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut tree, root, _, grandchild) = chain();
        assert!(matches!(tree.add_child(grandchild, root), Err(SceneError::HierarchyCycle)));
        assert!(matches!(tree.add_child(root, root), Err(SceneError::HierarchyCycle)));
        assert_eq!(tree.parent(root).expect("parent"), None);
    }

    #[test]
    fn test_hierarchical_aabb_contains_children() {
        let (mut tree, root, child, grandchild) = chain();
        let unit = Aabb::cube(Vec3::zeros(), 0.5);
        for id in [root, child, grandchild] {
            tree.set_local_aabb(id, unit).expect("local aabb");
        }

        tree.refresh(root).expect("refresh");

        for id in [root, child, grandchild] {
            let node = tree.node(id).expect("node");
            let own = node.local_aabb().transformed(&tree.world_matrix(id).expect("world"));
            let hierarchical = node.world_aabb();
            assert!(hierarchical.contains_aabb(&own));
            for c in node.children() {
                assert!(hierarchical.contains_aabb(&tree.world_aabb(*c).expect("child aabb")));
            }
        }

        // Grandchild sits at (2, 1, 0) + rotated (0, 0, 3) * 2 scale = (2 + 3, 1, 0).
        let gc = tree.world_aabb(grandchild).expect("gc");
        assert_relative_eq!(gc.center(), Vec3::new(5.0, 1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(gc.extents(), Vec3::repeat(1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_fallback_box_without_geometry() {
        let (mut tree, root, _, grandchild) = chain();
        tree.refresh(root).expect("refresh");

        let origin = tree.world_matrix(grandchild).expect("world").transform_point(&Point3::origin());
        let fallback = tree.world_aabb(grandchild).expect("aabb");
        assert_relative_eq!(fallback.center(), origin.coords, epsilon = 1e-5);
        assert_relative_eq!(fallback.extents(), Vec3::repeat(DEFAULT_FALLBACK_HALF_EXTENT), epsilon = 1e-6);

        // Root has no geometry of its own but still covers its descendants.
        assert!(tree.world_aabb(root).expect("root").contains_aabb(&fallback));
    }

    #[test]
    fn test_accessors_do_not_recompute() {
        let (mut tree, root, _, _) = chain();
        tree.set_local_aabb(root, Aabb::cube(Vec3::zeros(), 1.0)).expect("aabb");
        tree.refresh(root).expect("refresh");
        let before = tree.world_aabb_max(root).expect("max");

        tree.set_position(root, Vec3::new(100.0, 0.0, 0.0)).expect("move");
        assert_eq!(tree.world_aabb_max(root).expect("stale max"), before);
    }

    #[test]
    fn test_remove_subtree_frees_descendants() {
        let (mut tree, root, child, grandchild) = chain();
        let removed = tree.remove_subtree(child).expect("remove");
        assert_eq!(removed, vec![child, grandchild]);
        assert_eq!(tree.len(), 1);
        assert!(tree.children(root).expect("root").is_empty());
        assert!(matches!(tree.world_matrix(grandchild), Err(SceneError::NodeNotFound)));
    }
}

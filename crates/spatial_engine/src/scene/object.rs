//! Spatial scene objects
//!
//! A [`SpatialObject`] owns one transform arena and the meshes bound to its
//! nodes. Drawing walks the arena depth-first and prunes any subtree whose
//! hierarchical bounds fail the frustum test or, when a separating plane is
//! active, lie entirely on the far side of it from the camera.

use std::ops::AddAssign;

use crate::bsp::BspPlane;
use crate::core::CullingConfig;
use crate::debug::DebugDrawSystem;
use crate::foundation::collections::{NodeId, NodeKey, ObjectId, SecondaryMap};
use crate::foundation::math::{LocalTransform, Quat, Vec3};
use crate::render::{DrawCall, MaterialBinding, MaterialHandle, MeshHandle, RenderBackend, ViewSource};
use crate::scene::{Aabb, Frustum, NodeRegistry, SceneDescription, SceneError, SceneResult, TransformTree};

/// What kind of drawable an object is
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Imported meshes drawn with their own materials
    MeshGroup,
    /// Application-made primitive drawn in a flat colour
    Primitive {
        /// RGBA colour
        color: [f32; 4],
    },
}

/// A mesh attached to one node of the object's tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBinding {
    /// Backend geometry handle
    pub mesh: MeshHandle,
    /// Number of indices to draw
    pub index_count: u32,
    /// Node whose world matrix positions the mesh
    pub node: NodeId,
    /// Material from the importer
    pub material: MaterialBinding,
}

/// Counters collected while drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Objects considered
    pub objects_visited: usize,
    /// Objects rejected by the frustum test on their root bounds
    pub frustum_culled: usize,
    /// Objects rejected as fully behind the separating plane
    pub bsp_culled: usize,
    /// Objects that passed both object-level tests
    pub drawn: usize,
    /// Mesh draws issued
    pub draw_calls: usize,
    /// Sub-root nodes whose subtree was pruned
    pub nodes_culled: usize,
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: Self) {
        self.objects_visited += other.objects_visited;
        self.frustum_culled += other.frustum_culled;
        self.bsp_culled += other.bsp_culled;
        self.drawn += other.drawn;
        self.draw_calls += other.draw_calls;
        self.nodes_culled += other.nodes_culled;
    }
}

/// Drawable unit owning a transform subtree and its mesh bindings
#[derive(Debug)]
pub struct SpatialObject {
    id: ObjectId,
    kind: ObjectKind,
    tree: TransformTree,
    root: NodeId,
    bindings: Vec<MeshBinding>,
    node_bindings: SecondaryMap<NodeId, Vec<usize>>,
    material_overrides: SecondaryMap<NodeId, MaterialHandle>,
    node_keys: SecondaryMap<NodeId, NodeKey>,
    bounds: Aabb,
}

impl SpatialObject {
    /// Build an object from an imported description.
    ///
    /// Every created node is registered under `id` in `registry`. Culling
    /// settings that fail validation are refused before anything is built.
    pub fn from_description(
        id: ObjectId,
        kind: ObjectKind,
        description: &SceneDescription,
        culling: &CullingConfig,
        registry: &mut NodeRegistry,
    ) -> SceneResult<Self> {
        culling.validate()?;
        description.validate()?;

        let mut tree = TransformTree::new().with_fallback_half_extent(culling.fallback_half_extent);
        let root_index = description.effective_root();
        let mut created: Vec<Option<NodeId>> = vec![None; description.nodes.len()];
        let mut pending_bindings = Vec::new();

        for (index, node) in description.nodes.iter().enumerate().skip(root_index) {
            let local = node.transform.to_local();
            let node_id = if index == root_index {
                tree.insert(node.name.clone(), local)
            } else {
                // Nodes outside the kept subtree (the collapsed wrapper) have no parent here.
                let Some(parent) = node.parent.and_then(|p| created[p]) else {
                    continue;
                };
                tree.insert_child(parent, node.name.clone(), local)?
            };

            tree.set_local_aabb(node_id, description.node_local_aabb(index, culling.default_node_half_extent)?)?;
            created[index] = Some(node_id);

            for mesh_index in &node.meshes {
                let mesh = description.mesh(*mesh_index)?;
                pending_bindings.push(MeshBinding {
                    mesh: mesh.mesh,
                    index_count: mesh.index_count,
                    node: node_id,
                    material: mesh.material,
                });
            }
        }

        let root = created[root_index].ok_or(SceneError::EmptyScene)?;
        let mut object = Self {
            id,
            kind,
            tree,
            root,
            bindings: Vec::new(),
            node_bindings: SecondaryMap::new(),
            material_overrides: SecondaryMap::new(),
            node_keys: SecondaryMap::new(),
            bounds: Aabb::new(Vec3::zeros(), Vec3::zeros()),
        };

        for (node, _) in object.tree.iter() {
            object.node_keys.insert(node, registry.register(id, node));
        }
        for binding in pending_bindings {
            object.push_binding(binding);
        }

        object.refresh()?;
        log::debug!(
            "Built object {:?}: {} nodes, {} mesh bindings",
            id,
            object.tree.len(),
            object.bindings.len()
        );
        Ok(object)
    }

    /// Handle of this object in its scene
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Drawable kind
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Root node of the transform tree
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Read-only access to the transform tree
    pub fn tree(&self) -> &TransformTree {
        &self.tree
    }

    /// Root hierarchical bounds from the last refresh
    pub fn world_aabb(&self) -> Aabb {
        self.bounds
    }

    /// Scene-wide registry key of a node
    pub fn node_key(&self, node: NodeId) -> Option<NodeKey> {
        self.node_keys.get(node).copied()
    }

    /// Set the local position of a node
    pub fn set_position(&mut self, node: NodeId, position: Vec3) -> SceneResult<()> {
        self.tree.set_position(node, position)
    }

    /// Set the local rotation of a node
    pub fn set_rotation(&mut self, node: NodeId, rotation: Quat) -> SceneResult<()> {
        self.tree.set_rotation(node, rotation)
    }

    /// Set the local scale of a node
    pub fn set_scale(&mut self, node: NodeId, scale: Vec3) -> SceneResult<()> {
        self.tree.set_scale(node, scale)
    }

    /// Create a node under `parent` owned by this object
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        local: LocalTransform,
        registry: &mut NodeRegistry,
    ) -> SceneResult<NodeId> {
        let node = self.tree.insert_child(parent, name, local)?;
        self.node_keys.insert(node, registry.register(self.id, node));
        Ok(node)
    }

    /// Free a node and its subtree along with every mesh bound inside it.
    ///
    /// The root cannot be removed this way; destroy the object instead.
    pub fn remove_node(&mut self, node: NodeId, registry: &mut NodeRegistry) -> SceneResult<()> {
        if node == self.root {
            return Err(SceneError::RootRemoval);
        }

        for removed in self.tree.remove_subtree(node)? {
            if let Some(key) = self.node_keys.remove(removed) {
                registry.unregister(key);
            }
            self.material_overrides.remove(removed);
        }

        let tree = &self.tree;
        self.bindings.retain(|binding| tree.contains(binding.node));
        self.reindex_bindings();
        Ok(())
    }

    /// Bind a mesh to a node of this object
    pub fn bind_mesh(&mut self, node: NodeId, mesh: MeshHandle, index_count: u32, material: MaterialBinding) -> SceneResult<usize> {
        if !self.tree.contains(node) {
            return Err(SceneError::NodeNotFound);
        }
        Ok(self.push_binding(MeshBinding {
            mesh,
            index_count,
            node,
            material,
        }))
    }

    fn push_binding(&mut self, binding: MeshBinding) -> usize {
        let index = self.bindings.len();
        self.bindings.push(binding);
        match self.node_bindings.get_mut(binding.node) {
            Some(list) => list.push(index),
            None => {
                self.node_bindings.insert(binding.node, vec![index]);
            }
        }
        index
    }

    fn reindex_bindings(&mut self) {
        let bindings = std::mem::take(&mut self.bindings);
        self.node_bindings.clear();
        for binding in bindings {
            self.push_binding(binding);
        }
    }

    /// All mesh bindings
    pub fn bindings(&self) -> &[MeshBinding] {
        &self.bindings
    }

    /// Checked binding lookup
    pub fn binding(&self, index: usize) -> SceneResult<&MeshBinding> {
        self.bindings.get(index).ok_or(SceneError::IndexOutOfRange {
            what: "mesh binding",
            index,
            len: self.bindings.len(),
        })
    }

    /// Bindings attached exactly to `node`
    pub fn bindings_for(&self, node: NodeId) -> impl Iterator<Item = &MeshBinding> + '_ {
        self.node_bindings
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(move |index| self.bindings.get(*index))
    }

    /// Draw every mesh bound to `node` with `material` instead of its own
    pub fn set_material_override(&mut self, node: NodeId, material: MaterialHandle) -> SceneResult<()> {
        if !self.tree.contains(node) {
            return Err(SceneError::NodeNotFound);
        }
        self.material_overrides.insert(node, material);
        Ok(())
    }

    /// Remove a material override, returning it
    pub fn clear_material_override(&mut self, node: NodeId) -> Option<MaterialHandle> {
        self.material_overrides.remove(node)
    }

    /// Material state for one binding.
    ///
    /// Node overrides win over the primitive colour, which wins over the
    /// imported material.
    fn material_for(&self, binding: &MeshBinding) -> MaterialBinding {
        if let Some(material) = self.material_overrides.get(binding.node) {
            return MaterialBinding::Material(*material);
        }
        match self.kind {
            ObjectKind::MeshGroup => binding.material,
            ObjectKind::Primitive { color } => MaterialBinding::FlatColor(color),
        }
    }

    /// Recompute world matrices and hierarchical bounds for the whole tree
    pub fn refresh(&mut self) -> SceneResult<Aabb> {
        self.bounds = self.tree.refresh(self.root)?;
        Ok(self.bounds)
    }

    /// Refresh, then draw whatever the camera's frustum can see
    pub fn draw(&mut self, view: &dyn ViewSource, backend: &mut dyn RenderBackend) -> SceneResult<RenderStats> {
        self.refresh()?;
        let frustum = Frustum::from_view_projection(&view.projection_matrix(), &view.view_matrix());
        self.draw_frustum_and_bsp(&frustum, None, view.position(), backend)
    }

    /// Frustum-pruned traversal using the bounds from the last refresh
    pub fn draw_with_frustum(&self, frustum: &Frustum, backend: &mut dyn RenderBackend) -> SceneResult<RenderStats> {
        self.draw_frustum_and_bsp(frustum, None, Vec3::zeros(), backend)
    }

    /// Depth-first traversal pruning subtrees outside the frustum and, when
    /// `plane` is given, subtrees entirely on the far side of it from
    /// `camera_position`. Uses the bounds from the last refresh.
    pub fn draw_frustum_and_bsp(
        &self,
        frustum: &Frustum,
        plane: Option<&BspPlane>,
        camera_position: Vec3,
        backend: &mut dyn RenderBackend,
    ) -> SceneResult<RenderStats> {
        let mut stats = RenderStats {
            objects_visited: 1,
            ..Default::default()
        };
        let plane = plane.map(|plane| (plane, plane.is_point_in_front(camera_position)));

        let mut stack = vec![self.root];
        while let Some(node_id) = stack.pop() {
            let node = self.tree.node(node_id)?;
            let bounds = node.world_aabb();
            let is_root = node_id == self.root;

            if !frustum.intersects_aabb(&bounds) {
                if is_root {
                    stats.frustum_culled += 1;
                } else {
                    stats.nodes_culled += 1;
                }
                continue;
            }

            if let Some((plane, camera_in_front)) = plane {
                if plane.is_fully_opposite(&bounds, camera_in_front) {
                    if is_root {
                        stats.bsp_culled += 1;
                    } else {
                        stats.nodes_culled += 1;
                    }
                    continue;
                }
            }

            if is_root {
                stats.drawn += 1;
            }

            let world = self.tree.world_matrix(node_id)?;
            for binding in self.bindings_for(node_id) {
                backend.draw_mesh(&DrawCall {
                    mesh: binding.mesh,
                    index_count: binding.index_count,
                    world,
                    material: self.material_for(binding),
                })?;
                stats.draw_calls += 1;
            }

            stack.extend(node.children().iter().rev().copied());
        }

        Ok(stats)
    }

    /// Queue a wireframe box for every node's hierarchical bounds
    pub fn draw_debug_bounds(&self, debug: &mut DebugDrawSystem, color: [f32; 3]) {
        for (_, node) in self.tree.iter() {
            debug.draw_aabb(node.world_aabb(), color);
        }
    }

    /// Unregister every node. The arena itself is freed when `self` drops.
    pub fn unregister_nodes(&mut self, registry: &mut NodeRegistry) {
        for (_, key) in self.node_keys.drain() {
            registry.unregister(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::translation_of;
    use crate::render::{Camera, RecordingBackend};
    use crate::scene::{MeshDescription, NodeDescription, NodeTransform};
    use approx::assert_relative_eq;
    use slotmap::KeyData;

    fn object_id() -> ObjectId {
        ObjectId::from(KeyData::from_ffi(1))
    }

    fn unit_mesh(id: u64) -> MeshDescription {
        MeshDescription {
            mesh: MeshHandle(id),
            index_count: 36,
            positions: vec![Vec3::repeat(-0.5), Vec3::repeat(0.5)],
            material: MaterialBinding::Material(MaterialHandle(id)),
        }
    }

    fn node(name: &str, x: f32, parent: Option<usize>, meshes: Vec<usize>) -> NodeDescription {
        NodeDescription {
            name: name.to_string(),
            transform: NodeTransform::Trs(LocalTransform::from_position(Vec3::new(x, 0.0, 0.0))),
            parent,
            meshes,
        }
    }

    /// Wrapper root, then a body at x=0 with a near arm at x=+3 and a far
    /// arm at x=-40 relative to the body.
    fn robot() -> SceneDescription {
        let mut description = SceneDescription::new();
        let body = description.add_mesh(unit_mesh(1));
        let near_arm = description.add_mesh(unit_mesh(2));
        let far_arm = description.add_mesh(unit_mesh(3));
        description.add_node(node("wrapper", 100.0, None, vec![]));
        description.add_node(node("body", 0.0, Some(0), vec![body]));
        description.add_node(node("near_arm", 3.0, Some(1), vec![near_arm]));
        description.add_node(node("far_arm", -40.0, Some(1), vec![far_arm]));
        description
    }

    fn build(description: &SceneDescription, registry: &mut NodeRegistry) -> SpatialObject {
        SpatialObject::from_description(object_id(), ObjectKind::MeshGroup, description, &CullingConfig::default(), registry)
            .expect("object")
    }

    fn camera_on_x() -> Camera {
        Camera::perspective(Vec3::new(10.0, 0.0, 0.0), 90.0, 1.0, 0.1, 30.0)
    }

    #[test]
    fn test_construction_collapses_wrapper_and_registers_nodes() {
        let mut registry = NodeRegistry::new();
        let object = build(&robot(), &mut registry);

        assert_eq!(object.tree().len(), 3);
        assert_eq!(object.bindings().len(), 3);
        assert_eq!(registry.count_for(object.id()), 3);

        // The wrapper's translation is dropped with it.
        let root_world = object.tree().world_matrix(object.root()).expect("root");
        assert_relative_eq!(translation_of(&root_world), Vec3::zeros());

        for binding in object.bindings() {
            assert!(object.tree().contains(binding.node));
        }
        for (node, _) in object.tree().iter() {
            let key = object.node_key(node).expect("key");
            let owner = registry.owner_of(key).expect("owner");
            assert_eq!(owner.object, object.id());
            assert_eq!(owner.node, node);
        }
    }

    #[test]
    fn test_refresh_covers_all_meshes() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let bounds = object.refresh().expect("refresh");
        assert_relative_eq!(bounds.min.x, -40.5);
        assert_relative_eq!(bounds.max.x, 3.5);
    }

    #[test]
    fn test_draw_prunes_subtree_outside_frustum() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let mut backend = RecordingBackend::new();

        // Far plane at distance 30 from x=10 leaves the arm at x=-40 outside.
        let stats = object.draw(&camera_on_x(), &mut backend).expect("draw");

        assert!(backend.drew_mesh(MeshHandle(1)));
        assert!(backend.drew_mesh(MeshHandle(2)));
        assert!(!backend.drew_mesh(MeshHandle(3)));
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.nodes_culled, 1);
        assert_eq!(stats.drawn, 1);
    }

    #[test]
    fn test_bsp_prunes_subtree_behind_plane() {
        let mut registry = NodeRegistry::new();
        let mut description = robot();
        description.nodes[3].transform = NodeTransform::Trs(LocalTransform::from_position(Vec3::new(-5.0, 0.0, 0.0)));
        let mut object = build(&description, &mut registry);
        object.refresh().expect("refresh");

        let camera = camera_on_x();
        let frustum = Frustum::from_view_projection(&camera.projection_matrix(), &camera.view_matrix());
        let plane = BspPlane::new(Vec3::x(), 0.0);

        let mut backend = RecordingBackend::new();
        let stats = object
            .draw_frustum_and_bsp(&frustum, Some(&plane), camera.position, &mut backend)
            .expect("draw");

        // Body straddles x=0 and is kept; the arm at x=-5 is fully behind.
        assert!(backend.drew_mesh(MeshHandle(1)));
        assert!(!backend.drew_mesh(MeshHandle(3)));
        assert_eq!(stats.nodes_culled, 1);

        backend.clear();
        object.draw_with_frustum(&frustum, &mut backend).expect("frustum only");
        assert!(backend.drew_mesh(MeshHandle(3)));
    }

    #[test]
    fn test_culled_root_draws_nothing() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let root = object.root();
        object.set_position(root, Vec3::new(0.0, 500.0, 0.0)).expect("move");

        let mut backend = RecordingBackend::new();
        let stats = object.draw(&camera_on_x(), &mut backend).expect("draw");
        assert_eq!(stats.frustum_culled, 1);
        assert_eq!(backend.draw_count(), 0);
    }

    #[test]
    fn test_draw_uses_world_matrix_of_bound_node() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let mut backend = RecordingBackend::new();
        object.draw(&camera_on_x(), &mut backend).expect("draw");

        let arm = backend.draws.iter().find(|d| d.mesh == MeshHandle(2)).expect("arm draw");
        assert_relative_eq!(translation_of(&arm.world), Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_material_override_and_primitive_colour() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let root = object.root();
        object.set_material_override(root, MaterialHandle(99)).expect("override");

        let mut backend = RecordingBackend::new();
        object.draw(&camera_on_x(), &mut backend).expect("draw");
        for call in &backend.draws {
            let expected = if call.mesh == MeshHandle(1) {
                MaterialBinding::Material(MaterialHandle(99))
            } else {
                MaterialBinding::Material(MaterialHandle(call.mesh.0))
            };
            assert_eq!(call.material, expected);
        }

        let red = [1.0, 0.0, 0.0, 1.0];
        let mut cube = SpatialObject::from_description(
            object_id(),
            ObjectKind::Primitive { color: red },
            &SceneDescription::cube(MeshHandle(5), 1.0),
            &CullingConfig::default(),
            &mut registry,
        )
        .expect("cube");
        backend.clear();
        cube.draw(&camera_on_x(), &mut backend).expect("draw cube");
        assert_eq!(backend.draws[0].material, MaterialBinding::FlatColor(red));
    }

    #[test]
    fn test_add_and_remove_nodes() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        let root = object.root();

        let hat = object
            .add_node(root, "hat", LocalTransform::from_position(Vec3::y()), &mut registry)
            .expect("add");
        let binding = object.bind_mesh(hat, MeshHandle(8), 36, MaterialBinding::Default).expect("bind");
        assert_eq!(object.binding(binding).expect("binding").node, hat);
        assert_eq!(registry.count_for(object.id()), 4);

        object.remove_node(hat, &mut registry).expect("remove");
        assert_eq!(registry.count_for(object.id()), 3);
        assert!(object.bindings().iter().all(|b| b.mesh != MeshHandle(8)));
        assert_eq!(object.bindings_for(root).count(), 1);
        assert!(matches!(
            object.binding(10),
            Err(SceneError::IndexOutOfRange { what: "mesh binding", index: 10, len: 3 })
        ));
        assert!(object.remove_node(root, &mut registry).is_err());
    }

    #[test]
    fn test_debug_bounds_one_box_per_node() {
        let mut registry = NodeRegistry::new();
        let object = build(&robot(), &mut registry);
        let mut debug = DebugDrawSystem::new();
        object.draw_debug_bounds(&mut debug, [0.0, 1.0, 0.0]);
        assert_eq!(debug.shape_count(), 3);
    }

    #[test]
    fn test_unregister_nodes() {
        let mut registry = NodeRegistry::new();
        let mut object = build(&robot(), &mut registry);
        object.unregister_nodes(&mut registry);
        assert!(registry.is_empty());
    }
}

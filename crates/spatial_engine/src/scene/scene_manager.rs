//! Scene Manager - owner of every spatial object
//!
//! Objects live in a slot map keyed by [`ObjectId`]. The manager also owns
//! the [`NodeRegistry`] and threads it through object construction and
//! destruction, so node registrations never outlive their object.

use crate::core::CullingConfig;
use crate::debug::DebugDrawSystem;
use crate::foundation::collections::{NodeId, NodeKey, ObjectId, SlotMap};
use crate::foundation::math::LocalTransform;
use crate::render::{MeshHandle, RenderBackend, ViewSource};
use crate::scene::{
    Frustum, NodeOwner, NodeRegistry, ObjectKind, RenderStats, SceneDescription, SceneError, SceneResult,
    SpatialObject,
};

/// Owns spatial objects and the node registry
#[derive(Debug, Default)]
pub struct SceneManager {
    objects: SlotMap<ObjectId, SpatialObject>,
    registry: NodeRegistry,
    culling: CullingConfig,
}

impl SceneManager {
    /// Create a new scene manager with default configuration
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            registry: NodeRegistry::new(),
            culling: CullingConfig::default(),
        }
    }

    /// Create a scene manager with custom culling settings.
    ///
    /// Fails when the settings do not pass [`CullingConfig::validate`].
    pub fn with_config(culling: CullingConfig) -> SceneResult<Self> {
        culling.validate()?;
        Ok(Self {
            culling,
            ..Self::new()
        })
    }

    /// Culling settings applied to newly spawned objects
    pub fn culling(&self) -> &CullingConfig {
        &self.culling
    }

    /// Build an object from an imported description
    pub fn spawn(&mut self, description: &SceneDescription, kind: ObjectKind) -> SceneResult<ObjectId> {
        let culling = &self.culling;
        let registry = &mut self.registry;
        let id = self
            .objects
            .try_insert_with_key(|id| SpatialObject::from_description(id, kind, description, culling, registry))?;
        log::debug!("Spawned object {:?} ({} objects)", id, self.objects.len());
        Ok(id)
    }

    /// Spawn a flat-coloured cube of the given half extent
    pub fn spawn_cube(&mut self, mesh: MeshHandle, half_extent: f32, color: [f32; 4]) -> SceneResult<ObjectId> {
        self.spawn(&SceneDescription::cube(mesh, half_extent), ObjectKind::Primitive { color })
    }

    /// Destroy an object, unregistering all of its nodes
    pub fn destroy(&mut self, id: ObjectId) -> SceneResult<()> {
        let mut object = self.objects.remove(id).ok_or(SceneError::ObjectNotFound)?;
        object.unregister_nodes(&mut self.registry);
        log::debug!("Destroyed object {:?} ({} objects left)", id, self.objects.len());
        Ok(())
    }

    /// Get an object
    pub fn get(&self, id: ObjectId) -> Option<&SpatialObject> {
        self.objects.get(id)
    }

    /// Get an object mutably
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SpatialObject> {
        self.objects.get_mut(id)
    }

    /// Whether `id` names a live object
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Object and node behind a registered node key
    pub fn owner_of(&self, key: NodeKey) -> Option<NodeOwner> {
        self.registry.owner_of(key)
    }

    /// The node registry
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Create a node under `parent` inside an object
    pub fn add_node(
        &mut self,
        object: ObjectId,
        parent: NodeId,
        name: impl Into<String>,
        local: LocalTransform,
    ) -> SceneResult<NodeId> {
        let target = self.objects.get_mut(object).ok_or(SceneError::ObjectNotFound)?;
        target.add_node(parent, name, local, &mut self.registry)
    }

    /// Free a node subtree inside an object
    pub fn remove_node(&mut self, object: ObjectId, node: NodeId) -> SceneResult<()> {
        let target = self.objects.get_mut(object).ok_or(SceneError::ObjectNotFound)?;
        target.remove_node(node, &mut self.registry)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// True when the scene holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over all objects
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SpatialObject)> {
        self.objects.iter()
    }

    /// Frustum-only draw of every object, without any separating plane
    pub fn draw_all(&mut self, view: &dyn ViewSource, backend: &mut dyn RenderBackend) -> SceneResult<RenderStats> {
        let frustum = Frustum::from_view_projection(&view.projection_matrix(), &view.view_matrix());
        let mut stats = RenderStats::default();
        for (_, object) in self.objects.iter_mut() {
            object.refresh()?;
            stats += object.draw_with_frustum(&frustum, backend)?;
        }
        log::trace!("Scene draw: {:?}", stats);
        Ok(stats)
    }

    /// Queue hierarchical bounds of every object
    pub fn draw_debug_bounds(&self, debug: &mut DebugDrawSystem, color: [f32; 3]) {
        for (_, object) in self.objects.iter() {
            object.draw_debug_bounds(debug, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::{Camera, RecordingBackend};

    #[test]
    fn test_spawn_and_destroy() {
        let mut scene = SceneManager::new();
        let cube = scene.spawn_cube(MeshHandle(1), 1.0, [1.0; 4]).expect("spawn");

        let object = scene.get(cube).expect("object");
        assert_eq!(object.id(), cube);
        let key = object.node_key(object.root()).expect("root key");
        assert_eq!(scene.owner_of(key).map(|owner| owner.object), Some(cube));

        scene.destroy(cube).expect("destroy");
        assert!(scene.get(cube).is_none());
        assert!(scene.owner_of(key).is_none());
        assert!(scene.registry().is_empty());
        assert!(matches!(scene.destroy(cube), Err(SceneError::ObjectNotFound)));
    }

    #[test]
    fn test_with_config_refuses_non_positive_extents() {
        let flat = CullingConfig::new().with_fallback_half_extent(0.0);
        assert!(matches!(SceneManager::with_config(flat), Err(SceneError::Config(_))));

        let inverted = CullingConfig::new().with_default_node_half_extent(-0.5);
        assert!(matches!(SceneManager::with_config(inverted), Err(SceneError::Config(_))));

        let scene = SceneManager::with_config(CullingConfig::new().with_fallback_half_extent(0.25)).expect("valid");
        assert_eq!(scene.culling().fallback_half_extent, 0.25);
    }

    #[test]
    fn test_spawn_rejects_invalid_description() {
        let mut scene = SceneManager::new();
        let result = scene.spawn(&SceneDescription::new(), ObjectKind::MeshGroup);
        assert!(matches!(result, Err(SceneError::EmptyScene)));
        assert!(scene.is_empty());
        assert!(scene.registry().is_empty());
    }

    #[test]
    fn test_nodes_added_through_scene_are_registered() {
        let mut scene = SceneManager::new();
        let cube = scene.spawn_cube(MeshHandle(1), 1.0, [1.0; 4]).expect("spawn");
        let root = scene.get(cube).expect("cube").root();

        let child = scene
            .add_node(cube, root, "marker", LocalTransform::from_position(Vec3::y()))
            .expect("add");
        assert_eq!(scene.registry().len(), 2);

        scene.remove_node(cube, child).expect("remove");
        assert_eq!(scene.registry().len(), 1);
    }

    #[test]
    fn test_draw_all_frustum_only() {
        let mut scene = SceneManager::new();
        let visible = scene.spawn_cube(MeshHandle(1), 1.0, [1.0; 4]).expect("visible");
        let hidden = scene.spawn_cube(MeshHandle(2), 1.0, [1.0; 4]).expect("hidden");
        let root = scene.get(hidden).expect("hidden").root();
        scene
            .get_mut(hidden)
            .expect("hidden")
            .set_position(root, Vec3::new(50.0, 0.0, 0.0))
            .expect("move");

        let camera = Camera::perspective(Vec3::new(10.0, 0.0, 0.0), 90.0, 1.0, 0.1, 100.0);
        let mut backend = RecordingBackend::new();
        let stats = scene.draw_all(&camera, &mut backend).expect("draw");

        assert!(backend.drew_mesh(MeshHandle(1)));
        assert!(!backend.drew_mesh(MeshHandle(2)));
        assert_eq!(stats.objects_visited, 2);
        assert_eq!(stats.frustum_culled, 1);
        assert!(scene.contains(visible));
    }
}

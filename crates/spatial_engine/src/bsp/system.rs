//! BSP visibility system
//!
//! Holds the registered objects and the configured separating planes. Only
//! the first plane takes part in culling: per frame, an object is skipped
//! when its bounds are outside the frustum or lie entirely on the side of
//! that plane the camera is not on. Everything else is handed to the
//! object's own frustum- and plane-aware traversal.

use crate::bsp::{BspNode, BspPlane};
use crate::core::{DebugConfig, DebugOverlay};
use crate::debug::DebugDrawSystem;
use crate::foundation::collections::ObjectId;
use crate::render::{RenderBackend, ViewSource};
use crate::scene::{Frustum, RenderStats, SceneManager, SceneResult};

/// Registered objects plus separating planes
#[derive(Debug, Default)]
pub struct BspSystem {
    objects: Vec<ObjectId>,
    planes: Vec<BspPlane>,
    root: BspNode,
}

impl BspSystem {
    /// Create an empty system with no planes
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered objects in registration order
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }

    /// Configured planes
    pub fn planes(&self) -> &[BspPlane] {
        &self.planes
    }

    /// The plane that drives culling, if any
    pub fn active_plane(&self) -> Option<&BspPlane> {
        self.planes.first()
    }

    /// Partition tree from the last build
    pub fn root(&self) -> &BspNode {
        &self.root
    }

    /// Register an object.
    ///
    /// Unknown and already registered objects are ignored. Returns whether
    /// the object was added.
    pub fn add_model(&mut self, id: ObjectId, scene: &SceneManager) -> bool {
        let Some(object) = scene.get(id) else {
            log::warn!("Ignoring BSP registration of unknown object {:?}", id);
            return false;
        };
        if self.objects.contains(&id) {
            return false;
        }

        self.objects.push(id);
        self.root.insert(id, object.world_aabb().center());
        true
    }

    /// Unregister an object; unknown objects are ignored
    pub fn remove_model(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| *o == id) else {
            return false;
        };
        self.objects.remove(index);
        self.root.remove(id);
        true
    }

    /// Replace the plane list and rebuild the partition tree.
    ///
    /// An empty list turns plane culling off.
    pub fn build_bsp(&mut self, planes: &[BspPlane], scene: &SceneManager) {
        self.planes = planes.to_vec();
        self.rebuild(scene);
    }

    /// Append a plane and rebuild
    pub fn add_plane(&mut self, plane: BspPlane, scene: &SceneManager) {
        self.planes.push(plane);
        self.rebuild(scene);
    }

    fn rebuild(&mut self, scene: &SceneManager) {
        self.root = BspNode::build(&self.planes);
        for id in &self.objects {
            if let Some(object) = scene.get(*id) {
                self.root.insert(*id, object.world_aabb().center());
            }
        }
        log::debug!(
            "Rebuilt BSP: {} planes, {} objects, depth {}",
            self.planes.len(),
            self.objects.len(),
            self.root.depth()
        );
    }

    /// Forget every object and plane
    pub fn clear(&mut self) {
        self.objects.clear();
        self.planes.clear();
        self.root = BspNode::leaf();
    }

    /// Cull and draw every registered object.
    ///
    /// Objects destroyed since registration are skipped.
    pub fn render(
        &self,
        scene: &mut SceneManager,
        view: &dyn ViewSource,
        backend: &mut dyn RenderBackend,
    ) -> SceneResult<RenderStats> {
        let frustum = Frustum::from_view_projection(&view.projection_matrix(), &view.view_matrix());
        let camera_position = view.position();
        let active = self
            .active_plane()
            .map(|plane| (plane, plane.is_point_in_front(camera_position)));

        let mut stats = RenderStats::default();
        for id in &self.objects {
            let Some(object) = scene.get_mut(*id) else {
                continue;
            };
            stats.objects_visited += 1;

            let bounds = object.refresh()?;
            if !frustum.intersects_aabb(&bounds) {
                stats.frustum_culled += 1;
                continue;
            }

            if let Some((plane, camera_in_front)) = active {
                if plane.is_fully_opposite(&bounds, camera_in_front) {
                    stats.bsp_culled += 1;
                    continue;
                }
            }

            let drawn = object.draw_frustum_and_bsp(&frustum, active.map(|(plane, _)| plane), camera_position, backend)?;
            stats.drawn += drawn.drawn;
            stats.draw_calls += drawn.draw_calls;
            stats.nodes_culled += drawn.nodes_culled;
        }

        log::trace!(
            "BSP render: {} visited, {} frustum culled, {} plane culled, {} drawn, {} draw calls",
            stats.objects_visited,
            stats.frustum_culled,
            stats.bsp_culled,
            stats.drawn,
            stats.draw_calls
        );
        Ok(stats)
    }

    /// Queue a grid for every configured plane
    pub fn draw_debug_planes(&self, debug: &mut DebugDrawSystem, config: &DebugConfig) {
        for plane in &self.planes {
            debug.draw_plane(*plane, config.plane_grid_size, config.plane_grid_lines, config.plane_color);
        }
    }

    /// [`render`](Self::render), then the overlays enabled in `config`
    /// flushed as one line batch
    pub fn render_with_debug(
        &self,
        scene: &mut SceneManager,
        view: &dyn ViewSource,
        backend: &mut dyn RenderBackend,
        debug: &mut DebugDrawSystem,
        config: &DebugConfig,
    ) -> SceneResult<RenderStats> {
        let stats = self.render(scene, view, backend)?;

        if config.overlays.contains(DebugOverlay::BOUNDS) {
            for id in &self.objects {
                if let Some(object) = scene.get(*id) {
                    object.draw_debug_bounds(debug, config.bounds_color);
                }
            }
        }
        if config.overlays.contains(DebugOverlay::PLANES) {
            self.draw_debug_planes(debug, config);
        }

        debug.flush(backend, &view.view_projection_matrix())?;
        Ok(stats)
    }
}

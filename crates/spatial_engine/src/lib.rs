//! # Spatial Engine
//!
//! Visibility core for real-time 3D rendering: transform hierarchies with
//! cached world matrices, hierarchical bounding boxes, frustum culling and a
//! binary-space-partition pass layered on top of a host-supplied
//! rasterization backend.
//!
//! ## Features
//!
//! - **Transform arenas**: per-object node trees with lazy world matrices
//! - **Frustum culling**: Gribb-Hartmann plane extraction and box tests
//! - **BSP culling**: skip objects fully behind a separating plane
//! - **Debug overlays**: wireframe bounds and plane grids as line batches
//!
//! ## Quick Start
//!
//! ```rust
//! use spatial_engine::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut scene = SceneManager::new();
//!     let near = scene.spawn_cube(MeshHandle(1), 1.0, [1.0, 0.0, 0.0, 1.0])?;
//!     let far = scene.spawn_cube(MeshHandle(2), 1.0, [0.0, 0.0, 1.0, 1.0])?;
//!     if let Some(object) = scene.get_mut(far) {
//!         let root = object.root();
//!         object.set_position(root, Vec3::new(-5.0, 0.0, 0.0))?;
//!         object.refresh()?;
//!     }
//!
//!     let mut bsp = BspSystem::new();
//!     bsp.add_model(near, &scene);
//!     bsp.add_model(far, &scene);
//!     bsp.build_bsp(&[BspPlane::new(Vec3::new(1.0, 0.0, 0.0), 0.0)], &scene);
//!
//!     let camera = Camera::perspective(Vec3::new(10.0, 0.0, 0.0), 90.0, 1.0, 0.1, 100.0);
//!     let mut backend = RecordingBackend::new();
//!     let stats = bsp.render(&mut scene, &camera, &mut backend)?;
//!     assert_eq!(stats.bsp_culled, 1);
//!     assert!(backend.drew_mesh(MeshHandle(1)));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;

pub mod foundation;
pub mod render;
pub mod scene;
pub mod bsp;
pub mod debug;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        bsp::{BspNode, BspPlane, BspSystem},
        config::{Config, ConfigError},
        core::{CullingConfig, DebugConfig, DebugOverlay, EngineConfig},
        debug::{DebugDrawSystem, LineVertex},
        foundation::{
            collections::{NodeId, NodeKey, ObjectId},
            math::{LocalTransform, Mat4, Quat, Vec3},
        },
        render::{Camera, DrawCall, MaterialBinding, MaterialHandle, MeshHandle, RecordingBackend, RenderBackend, ViewSource},
        scene::{
            Aabb, Frustum, ObjectKind, RenderStats, SceneDescription, SceneError, SceneManager, SceneResult,
            SpatialObject, TransformTree,
        },
    };
}

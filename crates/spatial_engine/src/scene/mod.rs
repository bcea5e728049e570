//! Scene management system
//!
//! Transform hierarchies, bounding volumes and frustum culling for drawable
//! objects.
//!
//! ## Architecture
//!
//! ```text
//! SceneDescription (importer output)
//!      ↓
//! SceneManager ── NodeRegistry
//!      ↓
//! SpatialObject ── TransformTree (arena) + mesh bindings
//!      ↓
//! RenderBackend
//! ```
//!
//! Each [`SpatialObject`] refreshes its world matrices and hierarchical
//! bounds, then draws depth-first, skipping any subtree whose bounds fall
//! outside the [`Frustum`].

mod bounds;
mod description;
mod error;
mod frustum;
mod object;
mod registry;
mod scene_manager;
mod transform;

pub use bounds::Aabb;
pub use description::{MeshDescription, NodeDescription, NodeTransform, SceneDescription, CUBE_INDEX_COUNT};
pub use error::{SceneError, SceneResult};
pub use frustum::{Frustum, Plane};
pub use object::{MeshBinding, ObjectKind, RenderStats, SpatialObject};
pub use registry::{NodeOwner, NodeRegistry};
pub use scene_manager::SceneManager;
pub use transform::{TransformNode, TransformTree, DEFAULT_FALLBACK_HALF_EXTENT};

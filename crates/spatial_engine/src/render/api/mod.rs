//! Public rendering API
//!
//! The backend trait and the handle / draw-request types it consumes.

pub mod render_backend;

pub use render_backend::{BackendResult, DrawCall, MaterialBinding, MaterialHandle, MeshHandle, RenderBackend};

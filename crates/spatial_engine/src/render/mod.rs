//! # Rendering System
//!
//! The seam between the visibility core and the host's rasterization API.
//!
//! ## Architecture
//!
//! - **API**: [`RenderBackend`] plus the handle and draw-request types it
//!   consumes. Implemented by the host, never by the core.
//! - **Camera**: [`ViewSource`] is everything culling needs from a camera;
//!   [`Camera`] is a ready-made look-at perspective camera.
//! - **Recording**: [`RecordingBackend`] stores requests instead of drawing
//!   them, for tests and headless tools.

pub mod api;
pub mod primitives;
pub mod recording;

pub use api::{BackendResult, DrawCall, MaterialBinding, MaterialHandle, MeshHandle, RenderBackend};
pub use primitives::{Camera, ViewSource};
pub use recording::RecordingBackend;

/// Errors reported by a rendering backend
///
/// The core only forwards these; it never produces them itself.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A rendering operation failed during execution
    ///
    /// Indicates failure while drawing meshes or debug lines. Often
    /// recoverable by skipping the frame.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Resource creation or management failed
    ///
    /// The backend could not resolve or create the GPU resource behind a
    /// handle.
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

//! Backend abstraction traits for the rendering system
//!
//! The visibility core never touches GPU state. It hands finished draw
//! requests to a [`RenderBackend`] implemented by the host application on top
//! of whatever rasterization API it uses.

use crate::debug::LineVertex;
use crate::foundation::math::Mat4;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to uploaded geometry (vertex array + index buffer) in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a material / texture set in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Material state bound for one draw
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MaterialBinding {
    /// Whatever the backend binds when nothing is specified
    #[default]
    Default,
    /// A backend material
    Material(MaterialHandle),
    /// Unlit RGBA colour, used by debug primitives
    FlatColor([f32; 4]),
}

/// One indexed draw request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Geometry to draw
    pub mesh: MeshHandle,
    /// Number of indices to submit
    pub index_count: u32,
    /// World (model) matrix of the node the mesh is bound to
    pub world: Mat4,
    /// Material state
    pub material: MaterialBinding,
}

/// Rasterization backend trait
///
/// Implementations issue the actual GPU work. Both calls happen on the
/// thread that drives the frame and must not retain the borrowed data.
pub trait RenderBackend {
    /// Issue one indexed mesh draw
    fn draw_mesh(&mut self, call: &DrawCall) -> BackendResult<()>;

    /// Draw a list of line segments, two vertices per segment, in world space
    fn draw_lines(&mut self, vertices: &[LineVertex], view_projection: &Mat4) -> BackendResult<()>;
}

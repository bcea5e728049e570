//! Headless backend that records what it was asked to draw
//!
//! Used by tests and by tools that need visibility results without a GPU.

use crate::debug::LineVertex;
use crate::foundation::math::Mat4;
use crate::render::api::{BackendResult, DrawCall, MeshHandle, RenderBackend};

/// Backend that stores every request instead of submitting it
#[derive(Debug, Default)]
pub struct RecordingBackend {
    /// Mesh draws in submission order
    pub draws: Vec<DrawCall>,
    /// Line vertices from every `draw_lines` call, concatenated
    pub lines: Vec<LineVertex>,
    /// Number of `draw_lines` calls
    pub line_batches: usize,
}

impl RecordingBackend {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.draws.clear();
        self.lines.clear();
        self.line_batches = 0;
    }

    /// Number of mesh draws recorded
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Whether any draw used the given mesh
    pub fn drew_mesh(&self, mesh: MeshHandle) -> bool {
        self.draws.iter().any(|call| call.mesh == mesh)
    }

    /// Number of line segments recorded
    pub fn line_segment_count(&self) -> usize {
        self.lines.len() / 2
    }
}

impl RenderBackend for RecordingBackend {
    fn draw_mesh(&mut self, call: &DrawCall) -> BackendResult<()> {
        self.draws.push(*call);
        Ok(())
    }

    fn draw_lines(&mut self, vertices: &[LineVertex], _view_projection: &Mat4) -> BackendResult<()> {
        self.lines.extend_from_slice(vertices);
        self.line_batches += 1;
        Ok(())
    }
}

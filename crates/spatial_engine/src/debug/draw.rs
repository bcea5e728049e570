//! Debug drawing primitives and system
//!
//! Shapes are queued during a frame, tessellated into line segments and
//! handed to the backend in a single `draw_lines` batch.

use bytemuck::{Pod, Zeroable};

use crate::bsp::BspPlane;
use crate::foundation::math::{Mat4, Vec3};
use crate::render::{BackendResult, RenderBackend};
use crate::scene::Aabb;

/// Line vertex as uploaded to the backend: position followed by RGB colour
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// World-space position
    pub position: [f32; 3],
    /// RGB colour
    pub color: [f32; 3],
}

impl LineVertex {
    /// Create a vertex from a world position and colour
    pub fn new(position: Vec3, color: [f32; 3]) -> Self {
        Self {
            position: [position.x, position.y, position.z],
            color,
        }
    }
}

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Start point
        start: Vec3,
        /// End point
        end: Vec3,
        /// RGB colour
        color: [f32; 3],
    },

    /// Wireframe axis-aligned box
    Box {
        /// World-space box
        bounds: Aabb,
        /// RGB colour
        color: [f32; 3],
    },

    /// Square grid lying on a plane, centred on the plane point closest to
    /// the origin
    PlaneGrid {
        /// Plane to draw
        plane: BspPlane,
        /// Half the side length of the grid
        half_size: f32,
        /// Lines on each side of the centre line
        lines_per_side: u32,
        /// RGB colour
        color: [f32; 3],
    },
}

impl DebugShape {
    /// Number of line segments this shape tessellates into
    pub fn segment_count(&self) -> usize {
        match self {
            DebugShape::Line { .. } => 1,
            DebugShape::Box { .. } => 12,
            DebugShape::PlaneGrid { lines_per_side, .. } => 2 * (2 * grid_lines(*lines_per_side) as usize + 1),
        }
    }

    /// Append this shape's segments to `out`, two vertices per segment
    pub fn tessellate(&self, out: &mut Vec<LineVertex>) {
        match self {
            DebugShape::Line { start, end, color } => {
                out.push(LineVertex::new(*start, *color));
                out.push(LineVertex::new(*end, *color));
            }
            DebugShape::Box { bounds, color } => tessellate_box(bounds, *color, out),
            DebugShape::PlaneGrid { plane, half_size, lines_per_side, color } => {
                tessellate_plane_grid(plane, *half_size, *lines_per_side, *color, out);
            }
        }
    }
}

/// Corner index pairs forming the 12 edges of a box, using the corner order
/// of [`Aabb::corners`]
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1), (2, 3), (4, 5), (6, 7),
    (0, 2), (1, 3), (4, 6), (5, 7),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

fn tessellate_box(bounds: &Aabb, color: [f32; 3], out: &mut Vec<LineVertex>) {
    let corners = bounds.corners();
    for (a, b) in BOX_EDGES {
        out.push(LineVertex::new(corners[a], color));
        out.push(LineVertex::new(corners[b], color));
    }
}

/// Lines per side actually drawn; a grid always has at least one
fn grid_lines(lines_per_side: u32) -> u32 {
    lines_per_side.max(1)
}

fn tessellate_plane_grid(plane: &BspPlane, half_size: f32, lines_per_side: u32, color: [f32; 3], out: &mut Vec<LineVertex>) {
    let normal = plane.normal;
    let centre = normal * -plane.distance;

    let helper = if normal.x.abs() > 0.9 { Vec3::y() } else { Vec3::x() };
    let tangent = normal.cross(&helper).normalize();
    let bitangent = normal.cross(&tangent).normalize();

    let lines = i64::from(grid_lines(lines_per_side));
    let step = half_size / lines as f32;

    for i in -lines..=lines {
        let offset = i as f32 * step;

        out.push(LineVertex::new(centre - tangent * half_size + bitangent * offset, color));
        out.push(LineVertex::new(centre + tangent * half_size + bitangent * offset, color));

        out.push(LineVertex::new(centre - bitangent * half_size + tangent * offset, color));
        out.push(LineVertex::new(centre + bitangent * half_size + tangent * offset, color));
    }
}

/// Debug drawing system
///
/// Collects shapes for the current frame. [`flush`](Self::flush) submits and
/// clears them.
pub struct DebugDrawSystem {
    shapes: Vec<DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawSystem {
    /// Create a new debug draw system
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            enabled: true,
        }
    }

    /// Queue an arbitrary shape
    pub fn draw(&mut self, shape: DebugShape) {
        if self.enabled {
            self.shapes.push(shape);
        }
    }

    /// Queue a line segment
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, color: [f32; 3]) {
        self.draw(DebugShape::Line { start, end, color });
    }

    /// Queue a wireframe box
    pub fn draw_aabb(&mut self, bounds: Aabb, color: [f32; 3]) {
        self.draw(DebugShape::Box { bounds, color });
    }

    /// Queue a plane grid
    pub fn draw_plane(&mut self, plane: BspPlane, half_size: f32, lines_per_side: u32, color: [f32; 3]) {
        self.draw(DebugShape::PlaneGrid {
            plane,
            half_size,
            lines_per_side,
            color,
        });
    }

    /// Number of queued shapes
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Tessellate every queued shape into line vertices
    pub fn vertices(&self) -> Vec<LineVertex> {
        let segments: usize = self.shapes.iter().map(DebugShape::segment_count).sum();
        let mut out = Vec::with_capacity(segments * 2);
        for shape in &self.shapes {
            shape.tessellate(&mut out);
        }
        out
    }

    /// Submit queued shapes as one line batch and clear the queue.
    ///
    /// Nothing reaches the backend when the queue is empty.
    pub fn flush(&mut self, backend: &mut dyn RenderBackend, view_projection: &Mat4) -> BackendResult<()> {
        if self.shapes.is_empty() {
            return Ok(());
        }

        let vertices = self.vertices();
        log::trace!("Flushing {} debug shapes ({} vertices)", self.shapes.len(), vertices.len());
        self.shapes.clear();
        backend.draw_lines(&vertices, view_projection)
    }

    /// Drop every queued shape
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

impl Default for DebugDrawSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw bytes of a vertex slice, ready for a vertex-buffer upload
pub fn vertex_bytes(vertices: &[LineVertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_has_twelve_edges_on_its_corners() {
        let bounds = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let mut out = Vec::new();
        DebugShape::Box { bounds, color: [1.0, 0.0, 0.0] }.tessellate(&mut out);

        assert_eq!(out.len(), 24);
        for vertex in &out {
            let p = Vec3::from(vertex.position);
            assert!(p.x.abs() == 1.0 && p.y.abs() == 2.0 && p.z.abs() == 3.0);
        }
    }

    #[test]
    fn test_plane_grid_lies_on_plane() {
        let plane = BspPlane::new(Vec3::new(0.0, 1.0, 0.0), -2.0);
        let shape = DebugShape::PlaneGrid {
            plane,
            half_size: 50.0,
            lines_per_side: 10,
            color: [1.0, 1.0, 0.0],
        };

        let mut out = Vec::new();
        shape.tessellate(&mut out);

        assert_eq!(out.len(), shape.segment_count() * 2);
        assert_eq!(shape.segment_count(), 42);
        for vertex in &out {
            assert_relative_eq!(plane.distance_to_point(Vec3::from(vertex.position)), 0.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_plane_grid_count_matches_tessellation() {
        for lines_per_side in [0, 1, 3] {
            let shape = DebugShape::PlaneGrid {
                plane: BspPlane::new(Vec3::x(), 0.0),
                half_size: 1.0,
                lines_per_side,
                color: [1.0, 1.0, 0.0],
            };
            let mut out = Vec::new();
            shape.tessellate(&mut out);
            assert_eq!(out.len(), shape.segment_count() * 2, "lines_per_side = {}", lines_per_side);
        }

        let single = DebugShape::PlaneGrid {
            plane: BspPlane::new(Vec3::x(), 0.0),
            half_size: 1.0,
            lines_per_side: 0,
            color: [1.0, 1.0, 0.0],
        };
        assert_eq!(single.segment_count(), 6);
    }

    #[test]
    fn test_flush_sends_one_batch_and_clears() {
        let mut system = DebugDrawSystem::new();
        system.draw_line(Vec3::zeros(), Vec3::x(), [1.0, 1.0, 1.0]);
        system.draw_aabb(Aabb::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)), [0.0, 1.0, 0.0]);

        let mut backend = RecordingBackend::new();
        system.flush(&mut backend, &Mat4::identity()).expect("flush");

        assert_eq!(backend.line_batches, 1);
        assert_eq!(backend.line_segment_count(), 13);
        assert_eq!(system.shape_count(), 0);

        system.flush(&mut backend, &Mat4::identity()).expect("empty flush");
        assert_eq!(backend.line_batches, 1);
    }

    #[test]
    fn test_disabled_system_ignores_shapes() {
        let mut system = DebugDrawSystem::new();
        system.enabled = false;
        system.draw_line(Vec3::zeros(), Vec3::y(), [1.0, 0.0, 0.0]);
        assert_eq!(system.shape_count(), 0);
    }

    #[test]
    fn test_vertex_bytes_layout() {
        let vertices = [LineVertex::new(Vec3::new(1.0, 2.0, 3.0), [0.5, 0.5, 0.5])];
        assert_eq!(vertex_bytes(&vertices).len(), 6 * std::mem::size_of::<f32>());
    }
}

//! Debug module for visualization and debugging tools
//!
//! Line-based overlays for culling inspection: hierarchical bounds as
//! wireframe boxes and splitting planes as square grids.

pub mod draw;

pub use draw::{vertex_bytes, DebugDrawSystem, DebugShape, LineVertex};

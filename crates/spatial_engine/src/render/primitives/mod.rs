//! Core primitive types for rendering

pub mod camera;

pub use camera::{Camera, ViewSource};

//! # Engine Configuration
//!
//! Configuration for the visibility core: logging, culling fallbacks and the
//! debug overlays drawn on top of the scene.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: log level, owns the other sections
//! - **Culling Config**: fallback bounding-box sizes for degenerate content
//! - **Debug Config**: which overlays to draw and how they look

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

bitflags! {
    /// Debug overlays that can be handed to the backend each frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DebugOverlay: u32 {
        /// Wireframe of every node's hierarchical AABB
        const BOUNDS = 1 << 0;
        /// Grid on every configured separating plane
        const PLANES = 1 << 1;
    }
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self::empty()
    }
}

/// # Culling Configuration
///
/// Sizes of the boxes substituted when content has no usable geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CullingConfig {
    /// Half extent of the world-space box used when a subtree produced no
    /// valid bounds at all
    pub fallback_half_extent: f32,
    /// Half extent of the local box given to imported nodes without meshes
    pub default_node_half_extent: f32,
}

impl CullingConfig {
    /// Create a culling configuration with the default sizes
    pub fn new() -> Self {
        Self {
            fallback_half_extent: 0.1,
            default_node_half_extent: 0.1,
        }
    }

    /// Set the fallback half extent
    pub fn with_fallback_half_extent(mut self, half_extent: f32) -> Self {
        self.fallback_half_extent = half_extent;
        self
    }

    /// Set the half extent for geometry-less imported nodes
    pub fn with_default_node_half_extent(mut self, half_extent: f32) -> Self {
        self.default_node_half_extent = half_extent;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fallback_half_extent > 0.0) {
            return Err(ConfigError::Invalid("fallback_half_extent must be positive".to_string()));
        }
        if !(self.default_node_half_extent > 0.0) {
            return Err(ConfigError::Invalid("default_node_half_extent must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for CullingConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Debug Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// Enabled overlays
    pub overlays: DebugOverlay,
    /// Half size of the grid drawn on separating planes
    pub plane_grid_size: f32,
    /// Grid lines on each side of the plane centre
    pub plane_grid_lines: u32,
    /// RGB colour of bounding-box wireframes
    pub bounds_color: [f32; 3],
    /// RGB colour of plane grids
    pub plane_color: [f32; 3],
}

impl DebugConfig {
    /// Create a debug configuration with every overlay disabled
    pub fn new() -> Self {
        Self {
            overlays: DebugOverlay::empty(),
            plane_grid_size: 50.0,
            plane_grid_lines: 10,
            bounds_color: [0.0, 1.0, 0.0],
            plane_color: [1.0, 1.0, 0.0],
        }
    }

    /// Enable the given overlays
    pub fn with_overlays(mut self, overlays: DebugOverlay) -> Self {
        self.overlays = overlays;
        self
    }

    /// Configure the plane grid
    pub fn with_plane_grid(mut self, size: f32, lines: u32) -> Self {
        self.plane_grid_size = size;
        self.plane_grid_lines = lines;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.plane_grid_size > 0.0) {
            return Err(ConfigError::Invalid("plane_grid_size must be positive".to_string()));
        }
        if self.plane_grid_lines == 0 {
            return Err(ConfigError::Invalid("plane_grid_lines must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Engine Configuration
///
/// Top-level configuration that applications load and hand to the
/// [`SceneManager`](crate::scene::SceneManager) and [`BspSystem`](crate::bsp::BspSystem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Culling fallbacks
    pub culling: CullingConfig,
    /// Debug overlays
    pub debug: DebugConfig,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            culling: CullingConfig::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the culling section
    pub fn with_culling(mut self, culling: CullingConfig) -> Self {
        self.culling = culling;
        self
    }

    /// Replace the debug section
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Start `env_logger` at the configured level; `RUST_LOG` overrides it
    pub fn init_logging(&self) {
        crate::foundation::logging::init_with_level(&self.log_level);
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.culling.validate()?;
        self.debug.validate()?;
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for EngineConfig {}

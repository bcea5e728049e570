//! # Core Engine Module
//!
//! Shared configuration used by every subsystem.

pub mod config;

pub use config::{Config, ConfigError, CullingConfig, DebugConfig, DebugOverlay, EngineConfig};

//! # splat-view: Gaussian-splat construction and visibility ordering
//!
//! This crate turns per-point attribute tables (as stored in 3D Gaussian
//! Splatting PLY files) into renderable Gaussians, and keeps a
//! back-to-front draw order current as the camera moves.
//!
//! ## Architecture
//!
//! - `core`: Gaussians, scene bounds, camera, math utilities
//! - `io`: attribute tables and PLY reading/writing
//! - `sort`: exact and bucketed visibility ordering, shared order buffer, sort worker
//! - `gpu`: Pod upload records for an external renderer
//! - `analysis`: scale anisotropy statistics
//! - `config`: JSON viewer configuration
//!
//! Rendering itself (windowing, shaders, blending) lives outside the crate.

// Core data structures and math
pub mod core;

// I/O operations (attribute tables, PLY)
pub mod io;

// Visibility ordering
pub mod sort;

// Upload layouts for the renderer
pub mod gpu;

pub mod analysis;
pub mod config;

// Re-export commonly used types at crate root for convenience
pub use config::ViewerConfig;
pub use core::{BuildError, BuildOptions, Camera, Gaussian, GaussianBuilder, GaussianCloud, SceneBounds};
pub use io::{AttributeTable, LoadError};
pub use sort::{SortConfig, SortDirection, SortStrategy, VisibilitySorter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core data structures and mathematical operations.
//!
//! This module contains the fundamental types used throughout the system:
//! - `Gaussian`: decoded, renderable 3D Gaussian
//! - `GaussianBuilder`: attribute rows → Gaussians
//! - `SceneBounds` / `BoundsTracker`: running AABB over Gaussian centers
//! - `Camera` / `Viewpoint`: the eye the ordering engine sorts against
//! - Math utilities: quaternions, sigmoid, SH DC decode
//!
//! All types here are "pure data" - no I/O, no rendering logic.

mod bounds;
mod builder;
mod camera;
mod gaussian;
pub mod math;

// Re-export public types
pub use bounds::{BoundsTracker, SceneBounds};
pub use builder::{
    build_row, covariance_from_scale_rotation, BuildError, BuildOptions, GaussianBuilder,
    GaussianRow, QuaternionLayout, REQUIRED_COLUMNS,
};
pub use camera::{Camera, Viewpoint};
pub use gaussian::{Gaussian, GaussianCloud};
pub use math::{inverse_sigmoid, quaternion_to_matrix, sh_dc_to_color, sigmoid, SH_C0};

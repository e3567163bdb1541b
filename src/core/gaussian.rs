//! Gaussian representation and cloud data structure.
//!
//! A constructed Gaussian is already decoded for rendering:
//! - Position (mean μ) in world space
//! - Base color from the SH DC term
//! - Opacity in [0, 1]
//! - World-space covariance Σ = (R·S)(R·S)^T

use crate::core::bounds::{BoundsTracker, SceneBounds};
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A renderable 3D Gaussian.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    /// Position (mean μ)
    pub position: Vector3<f32>,

    /// Base RGB color, decoded from the order-0 SH coefficient.
    /// Not clamped; values slightly outside [0, 1] are legal.
    pub color: Vector3<f32>,

    /// Opacity in [0, 1]
    pub opacity: f32,

    /// Symmetric positive semi-definite covariance
    pub covariance: Matrix3<f32>,
}

impl Gaussian {
    pub fn new(
        position: Vector3<f32>,
        color: Vector3<f32>,
        opacity: f32,
        covariance: Matrix3<f32>,
    ) -> Self {
        Self {
            position,
            color,
            opacity,
            covariance,
        }
    }

    /// Position in homogeneous coordinates (w = 1).
    pub fn homogeneous_position(&self) -> Vector4<f32> {
        self.position.push(1.0)
    }

    /// Color with opacity in the alpha channel.
    pub fn rgba(&self) -> Vector4<f32> {
        self.color.push(self.opacity)
    }

    /// Covariance embedded in a 4×4 matrix (upper-left block, [3][3] = 1).
    pub fn covariance4(&self) -> Matrix4<f32> {
        self.covariance.to_homogeneous()
    }

    /// Euclidean distance from `point` to the Gaussian center.
    pub fn distance_to(&self, point: &Vector3<f32>) -> f32 {
        (self.position - point).norm()
    }

    /// True when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite())
            && self.color.iter().all(|v| v.is_finite())
            && self.opacity.is_finite()
            && self.covariance.iter().all(|v| v.is_finite())
    }
}

/// An immutable collection of Gaussians together with their scene bounds.
///
/// Array-of-Structs layout; [`crate::gpu::GaussianGpu`] is the upload form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GaussianCloud {
    gaussians: Vec<Gaussian>,
    bounds: SceneBounds,
}

impl GaussianCloud {
    /// Create a cloud from a vector of Gaussians, computing the bounds.
    pub fn from_gaussians(gaussians: Vec<Gaussian>) -> Self {
        let mut tracker = BoundsTracker::new();
        for g in &gaussians {
            tracker.update(&g.position);
        }
        Self {
            gaussians,
            bounds: tracker.get(),
        }
    }

    /// Assemble a cloud whose bounds were already tracked during construction.
    pub(crate) fn from_parts(gaussians: Vec<Gaussian>, bounds: SceneBounds) -> Self {
        Self { gaussians, bounds }
    }

    pub fn len(&self) -> usize {
        self.gaussians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaussians.is_empty()
    }

    pub fn bounds(&self) -> SceneBounds {
        self.bounds
    }

    pub fn as_slice(&self) -> &[Gaussian] {
        &self.gaussians
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gaussian> {
        self.gaussians.iter()
    }

    pub fn into_gaussians(self) -> Vec<Gaussian> {
        self.gaussians
    }
}

impl std::ops::Index<usize> for GaussianCloud {
    type Output = Gaussian;

    fn index(&self, index: usize) -> &Gaussian {
        &self.gaussians[index]
    }
}

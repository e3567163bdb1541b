//! GPU-friendly data types for Gaussian splatting.
//!
//! These types are designed to be uploaded directly to GPU buffers:
//! - Flat memory layout (no pointers)
//! - Proper alignment (16-byte for vec4/mat4)
//! - bytemuck Pod + Zeroable traits

use crate::core::{Gaussian, GaussianCloud};

/// GPU representation of a Gaussian.
///
/// Matches a std430 struct `{ vec4 pos; vec4 color; mat4 sigma; }`:
/// 96 bytes per Gaussian.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GaussianGpu {
    /// Position in world space (x, y, z, 1)
    pub position: [f32; 4],

    /// Base color and opacity (r, g, b, a)
    pub color: [f32; 4],

    /// Covariance, column-major 4×4. Only the upper-left 3×3 is meaningful;
    /// [3][3] = 1 and the rest of the padding is 0.
    pub covariance: [[f32; 4]; 4],
}

impl GaussianGpu {
    /// Convert from CPU Gaussian to GPU format.
    pub fn from_gaussian(g: &Gaussian) -> Self {
        let c4 = g.covariance4();
        // Column-major, as GLSL/WGSL mat4 expects.
        let mut covariance = [[0.0f32; 4]; 4];
        for (col, out) in covariance.iter_mut().enumerate() {
            for (row, v) in out.iter_mut().enumerate() {
                *v = c4[(row, col)];
            }
        }

        Self {
            position: g.homogeneous_position().into(),
            color: g.rgba().into(),
            covariance,
        }
    }
}

impl GaussianCloud {
    /// Records in upload order (same indexing as the cloud).
    pub fn to_gpu(&self) -> Vec<GaussianGpu> {
        self.iter().map(GaussianGpu::from_gaussian).collect()
    }
}

/// Raw bytes of a Gaussian buffer.
pub fn gaussian_bytes(records: &[GaussianGpu]) -> &[u8] {
    bytemuck::cast_slice(records)
}

/// Raw bytes of an index buffer.
pub fn index_bytes(order: &[u32]) -> &[u8] {
    bytemuck::cast_slice(order)
}

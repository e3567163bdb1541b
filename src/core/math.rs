//! Mathematical utilities (quaternions, activation functions, SH decode).

use nalgebra::{Matrix3, Vector3};

/// Zeroth-order real spherical harmonic, Y_0^0 = 1 / (2·sqrt(π)).
pub const SH_C0: f32 = 0.282_094_791_773_878_14;

/// Squared norm below which a quaternion is treated as zero.
const QUATERNION_EPSILON: f32 = 1e-12;

/// Convert a quaternion q = w + xi + yj + zk to a 3×3 rotation matrix.
///
/// Formula:
/// R = | 1-2(y²+z²)   2(xy-wz)    2(xz+wy)  |
///     | 2(xy+wz)     1-2(x²+z²)  2(yz-wx)  |
///     | 2(xz-wy)     2(yz+wx)    1-2(x²+y²)|
///
/// No normalization happens here. A non-unit quaternion produces a matrix
/// that is no longer orthogonal; see [`normalize_quaternion`].
pub fn quaternion_to_matrix(w: f32, x: f32, y: f32, z: f32) -> Matrix3<f32> {
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);

    Matrix3::new(
        1.0 - 2.0 * (yy + zz),
        2.0 * (xy - wz),
        2.0 * (xz + wy),
        2.0 * (xy + wz),
        1.0 - 2.0 * (xx + zz),
        2.0 * (yz - wx),
        2.0 * (xz - wy),
        2.0 * (yz + wx),
        1.0 - 2.0 * (xx + yy),
    )
}

/// Normalize a quaternion given as (w, x, y, z).
///
/// Returns `None` when the quaternion is zero (or not finite) and has no
/// meaningful direction.
pub fn normalize_quaternion(w: f32, x: f32, y: f32, z: f32) -> Option<[f32; 4]> {
    let norm_sq = w * w + x * x + y * y + z * z;
    if !norm_sq.is_finite() || norm_sq < QUATERNION_EPSILON {
        return None;
    }
    let inv = norm_sq.sqrt().recip();
    Some([w * inv, x * inv, y * inv, z * inv])
}

/// Sigmoid activation function: σ(x) = 1 / (1 + e^(-x))
///
/// Maps R → [0, 1]. Evaluated so that `exp` only ever sees a non-positive
/// argument, which keeps large-magnitude logits from overflowing. NaN maps
/// to 0 (fully transparent).
pub fn sigmoid(x: f32) -> f32 {
    if x.is_nan() {
        return 0.0;
    }
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse sigmoid (logit): logit(p) = log(p / (1-p))
///
/// Maps (0, 1) → R
pub fn inverse_sigmoid(p: f32) -> f32 {
    // Clamp to avoid log(0) or division by zero
    let p_clamped = p.clamp(1e-6, 1.0 - 1e-6);
    (p_clamped / (1.0 - p_clamped)).ln()
}

/// Decode the DC spherical-harmonic coefficients into a base RGB color.
///
/// color = 0.5 + Y_0^0 · c. The result is not clamped.
pub fn sh_dc_to_color(dc: [f32; 3]) -> Vector3<f32> {
    Vector3::new(
        0.5 + SH_C0 * dc[0],
        0.5 + SH_C0 * dc[1],
        0.5 + SH_C0 * dc[2],
    )
}

/// Inverse of [`sh_dc_to_color`].
pub fn color_to_sh_dc(color: Vector3<f32>) -> [f32; 3] {
    [
        (color.x - 0.5) / SH_C0,
        (color.y - 0.5) / SH_C0,
        (color.z - 0.5) / SH_C0,
    ]
}

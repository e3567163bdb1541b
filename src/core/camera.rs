//! Free-fly viewing camera.
//!
//! The ordering engine only needs a world-space eye position (see
//! [`Viewpoint`]). The view and projection matrices are provided for the
//! external renderer's uniforms.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Anything that can report a world-space eye position.
pub trait Viewpoint {
    fn position(&self) -> Vector3<f32>;
}

impl Viewpoint for Vector3<f32> {
    fn position(&self) -> Vector3<f32> {
        *self
    }
}

/// A perspective camera with yaw/pitch orientation (no roll).
///
/// Conventions: right-handed, +y up, looking down -z at zero yaw/pitch,
/// OpenGL clip space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vector3<f32>,

    /// Rotation about world +y (radians)
    pub yaw: f32,

    /// Rotation about the camera's x axis (radians), kept in [-π/2, π/2]
    pub pitch: f32,

    /// Viewport width (pixels)
    pub width: u32,

    /// Viewport height (pixels)
    pub height: u32,

    /// Vertical field of view (radians)
    pub fov_y: f32,

    pub near: f32,
    pub far: f32,

    /// Scale applied to every [`Camera::translate`] delta
    pub speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            yaw: 0.0,
            pitch: 0.0,
            width: 1280,
            height: 720,
            fov_y: std::f32::consts::FRAC_PI_2,
            near: 0.2,
            far: 1000.0,
            speed: 0.2,
        }
    }
}

impl Camera {
    /// Camera at `position` with default lens and orientation.
    pub fn at(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Camera-to-world rotation.
    pub fn orientation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), self.yaw)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), self.pitch)
    }

    /// Unit viewing direction in world space.
    pub fn forward(&self) -> Vector3<f32> {
        self.orientation() * -Vector3::z()
    }

    /// Unit right vector in world space.
    pub fn right(&self) -> Vector3<f32> {
        self.orientation() * Vector3::x()
    }

    /// World up. Movement stays level regardless of pitch.
    pub fn up(&self) -> Vector3<f32> {
        Vector3::y()
    }

    /// Move by `delta` (world space) scaled by `speed`.
    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.position += self.speed * delta;
    }

    /// Turn by the given yaw/pitch increments. Pitch is clamped to ±90°.
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        use std::f32::consts::FRAC_PI_2;
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-FRAC_PI_2, FRAC_PI_2);
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// World-to-camera transform.
    ///
    /// V = R^T · T(-position)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let inverse_rotation = self.orientation().inverse().to_homogeneous();
        inverse_rotation * Matrix4::new_translation(&-self.position)
    }

    /// Camera-to-clip transform.
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect(), self.fov_y, self.near, self.far)
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl Viewpoint for Camera {
    fn position(&self) -> Vector3<f32> {
        self.position
    }
}

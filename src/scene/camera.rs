use nalgebra as na;
use na::{vector, Matrix4, Vector3};

use super::transform::{checked_view_matrix, perspective_matrix, Pose};
use super::util::{rgba, Color};
use crate::error::Result;

/// Perspective camera. `fov_y` is the vertical field of view in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Pose,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view_matrix(&self) -> Result<Matrix4<f32>> {
        return checked_view_matrix(&self.pose, "camera");
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        return perspective_matrix(self.near, self.far, self.fov_y, self.aspect);
    }

    /// The 8 frustum corners in camera-local (view) space, near and far corner of each
    /// side interleaved.
    pub fn frustum_corners(&self) -> [Vector3<f32>; 8] {
        let tan_half_fov = (self.fov_y.to_radians() * 0.5).tan();
        let half_height_near = self.near * tan_half_fov;
        let half_width_near = half_height_near * self.aspect;
        let half_height_far = self.far * tan_half_fov;
        let half_width_far = half_height_far * self.aspect;

        let signs: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        let mut corners = [Vector3::zeros(); 8];
        for (i, &(dx, dy)) in signs.iter().enumerate() {
            corners[2 * i] = vector![half_width_near * dx, half_height_near * dy, self.near];
            corners[2 * i + 1] = vector![half_width_far * dx, half_height_far * dy, self.far];
        }
        return corners;
    }
}

/// Directional light. Only the orientation of the pose affects lighting, the position
/// anchors the light view used for the shadow map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub pose: Pose,
    pub color: Color,
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn new(pose: Pose) -> Self {
        return Self { pose, color: rgba(1.0, 1.0, 1.0, 1.0), intensity: 1.0 };
    }

    pub fn view_matrix(&self) -> Result<Matrix4<f32>> {
        return checked_view_matrix(&self.pose, "light");
    }
}

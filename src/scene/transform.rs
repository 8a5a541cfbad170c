//! Builders for view and projection matrices. All of them are pure functions of their
//! arguments and return a fresh matrix.

use nalgebra as na;
use na::{matrix, Matrix4, Vector3};

use crate::error::{RenderError, Result};

/// Position and orientation of a camera or a light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Pose {
    pub fn new(position: Vector3<f32>, forward: Vector3<f32>, up: Vector3<f32>) -> Self {
        return Self { position, forward: forward.normalize(), up: up.normalize() };
    }

    /// Pose at `position` looking at `target`.
    pub fn look_at(position: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Self {
        return Self::new(position, target - position, up);
    }
}

/// View matrix for a pose. The basis is right = up x forward, true up = forward x right, and
/// forward maps to +z, so the view space is left-handed with the camera looking down +z.
pub fn view_matrix(pose: &Pose) -> Matrix4<f32> {
    let forward = pose.forward.normalize();
    let right = pose.up.cross(&forward).normalize();
    let true_up = forward.cross(&right).normalize();
    let p = pose.position;
    return matrix![right.x,   right.y,   right.z,   -right.dot(&p);
                   true_up.x, true_up.y, true_up.z, -true_up.dot(&p);
                   forward.x, forward.y, forward.z, -forward.dot(&p);
                   0.0,       0.0,       0.0,       1.0];
}

/// `view_matrix` that fails instead of returning NaNs when forward and up are parallel or zero.
pub fn checked_view_matrix(pose: &Pose, what: &'static str) -> Result<Matrix4<f32>> {
    let view = view_matrix(pose);
    if !view.iter().all(|v| v.is_finite()) {
        return Err(RenderError::DegenerateView { what });
    }
    return Ok(view);
}

/// Perspective projection with vertical field of view in degrees.
/// Clip w equals view-space z, and after the divide near maps to z = 0 and far to z = 1.
pub fn perspective_matrix(near: f32, far: f32, fov_y: f32, aspect: f32) -> Matrix4<f32> {
    let f = 1.0 / (fov_y.to_radians() * 0.5).tan();
    return matrix![f / aspect, 0.0, 0.0,                 0.0;
                   0.0,        f,   0.0,                 0.0;
                   0.0,        0.0, far / (far - near),  far * near / (near - far);
                   0.0,        0.0, 1.0,                 0.0];
}

/// Orthographic projection of the box [min, max] onto [-1, 1] on every axis.
/// Fails if the box is empty along an axis.
pub fn orthographic_matrix(min: Vector3<f32>, max: Vector3<f32>) -> Result<Matrix4<f32>> {
    for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
        if !(hi - lo > f32::EPSILON) {
            return Err(RenderError::DegenerateProjection { axis, min: lo, max: hi });
        }
    }
    let (l, r) = (min.x, max.x);
    let (b, t) = (min.y, max.y);
    let (n, f) = (min.z, max.z);
    return Ok(matrix![2.0 / (r - l), 0.0,           0.0,           -(r + l) / (r - l);
                      0.0,           2.0 / (t - b), 0.0,           -(t + b) / (t - b);
                      0.0,           0.0,           2.0 / (f - n), -(f + n) / (f - n);
                      0.0,           0.0,           0.0,           1.0]);
}

/// Maps NDC x, y in [-1, 1] to [0, width] x [0, height], z is passed through.
pub fn viewport_matrix(width: u32, height: u32) -> Matrix4<f32> {
    let w = width as f32 / 2.0;
    let h = height as f32 / 2.0;
    return matrix![w,   0.0, 0.0, w;
                   0.0, h,   0.0, h;
                   0.0, 0.0, 1.0, 0.0;
                   0.0, 0.0, 0.0, 1.0];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::util::transform_point;
    use approx::assert_relative_eq;
    use nalgebra::{vector, Matrix3};

    fn pose() -> Pose {
        return Pose::new(vector![1.0, 2.0, -3.0], vector![0.3, -0.2, 1.0], vector![0.0, 1.0, 0.0]);
    }

    #[test]
    fn view_matrix_moves_pose_to_origin() {
        let pose = pose();
        let view = view_matrix(&pose);
        assert_relative_eq!(transform_point(&view, pose.position), vector![0.0, 0.0, 0.0], epsilon = 1e-5);
        // A point straight ahead lands on +z.
        let ahead = transform_point(&view, pose.position + pose.forward * 5.0);
        assert_relative_eq!(ahead, vector![0.0, 0.0, 5.0], epsilon = 1e-5);
    }

    #[test]
    fn view_basis_is_orthonormal() {
        let view = view_matrix(&pose());
        let rotation = view.fixed_slice::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(rotation * rotation.transpose(), Matrix3::identity(), epsilon = 1e-5);
        assert_relative_eq!(rotation.determinant(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn parallel_up_is_rejected() {
        let degenerate = Pose::new(vector![0.0, 0.0, 0.0], vector![0.0, 1.0, 0.0], vector![0.0, 2.0, 0.0]);
        assert!(matches!(
            checked_view_matrix(&degenerate, "light"),
            Err(RenderError::DegenerateView { what: "light" })
        ));
        assert!(checked_view_matrix(&pose(), "camera").is_ok());
    }

    #[test]
    fn perspective_maps_near_and_far() {
        let projection = perspective_matrix(0.5, 20.0, 60.0, 1.5);
        let near = transform_point(&projection, vector![0.0, 0.0, 0.5]);
        let far = transform_point(&projection, vector![0.0, 0.0, 20.0]);
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
        // Top edge of the vertical fov maps to y = 1.
        let top = transform_point(&projection, vector![0.0, 30f32.to_radians().tan() * 4.0, 4.0]);
        assert_relative_eq!(top.y, 1.0, epsilon = 1e-5);
        // w carries view z.
        let clip = projection * vector![0.0, 0.0, 7.0, 1.0];
        assert_relative_eq!(clip.w, 7.0);
    }

    #[test]
    fn orthographic_maps_box_to_unit_cube() {
        let min = vector![-2.0, 1.0, 0.5];
        let max = vector![4.0, 3.0, 10.0];
        let ortho = orthographic_matrix(min, max).unwrap();
        assert_relative_eq!(transform_point(&ortho, min), vector![-1.0, -1.0, -1.0], epsilon = 1e-5);
        assert_relative_eq!(transform_point(&ortho, max), vector![1.0, 1.0, 1.0], epsilon = 1e-5);
    }

    #[test]
    fn orthographic_rejects_flat_box() {
        let result = orthographic_matrix(vector![0.0, 0.0, 1.0], vector![1.0, 1.0, 1.0]);
        match result {
            Err(RenderError::DegenerateProjection { axis, .. }) => assert_eq!(axis, 'z'),
            other => panic!("expected degenerate projection, got {:?}", other),
        }
    }

    #[test]
    fn viewport_maps_ndc_corners() {
        let viewport = viewport_matrix(640, 480);
        let low = transform_point(&viewport, vector![-1.0, -1.0, 0.25]);
        let high = transform_point(&viewport, vector![1.0, 1.0, 0.25]);
        assert_relative_eq!(low, vector![0.0, 0.0, 0.25]);
        assert_relative_eq!(high, vector![640.0, 480.0, 0.25]);
    }
}

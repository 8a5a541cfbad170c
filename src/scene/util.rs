use std::ops::{Add, Mul};

use nalgebra as na;
use na::{vector, Matrix4, Vector2, Vector3, Vector4};

/// Linear RGBA, every channel in [0, 1].
pub type Color = Vector4<f32>;

pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Color {
    return vector![r, g, b, a];
}

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Transformation of a vector to homogenous coordinates.
pub fn to_hom_vector(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 0.0];
}

/// Transformation of a point from homogenous coordinates.
pub fn from_hom_point(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w];
}

/// Transformation of a vector from homogenous coordinates.
pub fn from_hom_vector(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x, v.y, v.z];
}

/// Applies `m` to a point, including the homogenous divide.
pub fn transform_point(m: &Matrix4<f32>, p: Vector3<f32>) -> Vector3<f32> {
    return from_hom_point(m * to_hom_point(p));
}

/// Applies `m` to a direction, translation is ignored.
pub fn transform_vector(m: &Matrix4<f32>, v: Vector3<f32>) -> Vector3<f32> {
    return from_hom_vector(m * to_hom_vector(v));
}

/// Convex combination of two colors: (1 - t) * a + t * b.
pub fn color_lerp(a: Color, b: Color, t: f32) -> Color {
    return a + (b - a) * t;
}

/// Signed area test of `p` against the directed edge `a -> b`.
/// Non-negative for all three edges of a positive-area triangle means `p` is inside.
pub fn edge_function(a: Vector2<f32>, b: Vector2<f32>, p: Vector2<f32>) -> f32 {
    return (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x);
}

/// Screen-space linear interpolation with barycentric weights.
pub fn interpolate<T>(bar_coord: Vector3<f32>, values: [T; 3]) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    return values[0] * bar_coord.x + values[1] * bar_coord.y + values[2] * bar_coord.z;
}

/// Perspective-correct interpolation. `perspective_factors` are the per-vertex 1/w values,
/// attributes are weighted by them and the sum is divided by the interpolated 1/w.
pub fn interpolate_perspective<T>(
    bar_coord: Vector3<f32>,
    perspective_factors: Vector3<f32>,
    values: [T; 3],
) -> T
where
    T: Copy + Add<Output = T> + Mul<f32, Output = T>,
{
    let weights = bar_coord.component_mul(&perspective_factors);
    let w = 1.0 / (weights.x + weights.y + weights.z);
    return interpolate(weights, values) * w;
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_and_vector_transforms() {
        let translation = Matrix4::new_translation(&vector![1.0, 2.0, 3.0]);
        let p = transform_point(&translation, vector![1.0, 1.0, 1.0]);
        assert_relative_eq!(p, vector![2.0, 3.0, 4.0]);
        let v = transform_vector(&translation, vector![1.0, 1.0, 1.0]);
        assert_relative_eq!(v, vector![1.0, 1.0, 1.0]);
    }

    #[test]
    fn homogenous_divide() {
        let p = from_hom_point(vector![2.0, 4.0, 6.0, 2.0]);
        assert_relative_eq!(p, vector![1.0, 2.0, 3.0]);
    }

    #[test]
    fn edge_function_sign_and_area() {
        let a = vector![0.0, 0.0];
        let b = vector![0.0, 4.0];
        let c = vector![4.0, 0.0];
        let area = edge_function(a, b, c);
        assert!(area > 0.0);

        // Weights of interior points are non-negative, bounded by the area and sum to it.
        for p in [vector![1.0, 1.0], vector![0.5, 3.0], vector![2.0, 0.1]] {
            let w0 = edge_function(b, c, p);
            let w1 = edge_function(c, a, p);
            let w2 = edge_function(a, b, p);
            for w in [w0, w1, w2] {
                assert!(w >= 0.0 && w <= area);
            }
            assert_relative_eq!((w0 + w1 + w2) / area, 1.0, epsilon = 1e-6);
        }

        // Outside point fails at least one edge.
        let outside = vector![5.0, 5.0];
        assert!(edge_function(b, c, outside) < 0.0);
    }

    #[test]
    fn perspective_interpolation_matches_clip_space_linear() {
        // Interpolating w itself has to give the harmonic mean, not the screen-space linear one.
        let w = vector![1.0, 4.0, 10.0];
        let factors = w.map(|value: f32| 1.0 / value);
        let bar_coord = vector![0.2, 0.3, 0.5];
        let interpolated = interpolate_perspective(bar_coord, factors, [w.x, w.y, w.z]);
        let expected: f32 = 1.0 / (0.2 / 1.0 + 0.3 / 4.0 + 0.5 / 10.0);
        assert_relative_eq!(interpolated, expected, epsilon = 1e-5);

        let naive = interpolate(bar_coord, [w.x, w.y, w.z]);
        assert!((naive - interpolated).abs() > 1.0);
    }

    #[test]
    fn color_lerp_endpoints() {
        let a = rgba(1.0, 0.0, 0.0, 1.0);
        let b = rgba(0.0, 0.0, 1.0, 1.0);
        assert_relative_eq!(color_lerp(a, b, 0.0), a);
        assert_relative_eq!(color_lerp(a, b, 1.0), b);
        assert_relative_eq!(color_lerp(a, b, 0.5), rgba(0.5, 0.0, 0.5, 1.0));
    }
}

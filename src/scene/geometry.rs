use nalgebra as na;
use na::{Matrix4, Vector3};

use super::model::Mesh;
use super::transform::viewport_matrix;
use super::util::{from_hom_point, to_hom_point, transform_point, transform_vector};

/// Per-frame result of pushing a mesh vertex through the transform chain. Rebuilt from the
/// mesh on every pass and never written back to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedVertex {
    pub world_position: Vector3<f32>,
    pub world_normal: Vector3<f32>,
    pub view_position: Vector3<f32>,
    pub view_normal: Vector3<f32>,
    /// x, y in pixels, z is NDC depth.
    pub screen: Vector3<f32>,
    /// 1 / w of the clip-space position.
    pub perspective_factor: f32,
}

impl TransformedVertex {
    /// False for vertices on or behind the camera plane, where the divide by w is meaningless.
    pub fn in_front(&self) -> bool {
        return self.perspective_factor > 0.0;
    }
}

/// Maps NDC x, y in [-1, 1] to pixel coordinates in [0, width] x [0, height], keeping z.
pub fn ndc_to_screen(ndc: Vector3<f32>, width: u32, height: u32) -> Vector3<f32> {
    return transform_point(&viewport_matrix(width, height), ndc);
}

/// Transforms every mesh vertex model -> world -> view -> clip -> NDC -> screen.
pub fn transform_vertices(
    mesh: &Mesh,
    model: &Matrix4<f32>,
    view: &Matrix4<f32>,
    projection: &Matrix4<f32>,
    width: u32,
    height: u32,
) -> Vec<TransformedVertex> {
    let viewport = viewport_matrix(width, height);
    let mvp = projection * view * model;
    return mesh
        .vertices()
        .iter()
        .map(|vertex| {
            let world_position = transform_point(model, vertex.position);
            let world_normal = transform_vector(model, vertex.normal);
            let clip = mvp * to_hom_point(vertex.position);
            let ndc = from_hom_point(clip);
            TransformedVertex {
                world_position,
                world_normal,
                view_position: transform_point(view, world_position),
                view_normal: transform_vector(view, world_normal),
                screen: transform_point(&viewport, ndc),
                perspective_factor: 1.0 / clip.w,
            }
        })
        .collect();
}

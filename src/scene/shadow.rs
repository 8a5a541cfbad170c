//! Shadow mapping for a single directional light: a depth-only pass from the light through an
//! orthographic projection fitted around the camera frustum, then a biased lookup per fragment.

use nalgebra as na;
use na::{vector, Matrix4, Vector3};

use super::buffer::DepthBuffer;
use super::camera::{Camera, DirectionalLight};
use super::driver::FrameStats;
use super::model::Mesh;
use super::raster::rasterize_coverage;
use super::transform::orthographic_matrix;
use super::util::transform_point;
use crate::config::ShadowResolution;
use crate::error::{RenderError, Result};

/// Light-space depth texture. Texel depths live in [0, depth_scale], the sentinel for "nothing
/// rendered" is `depth_scale` itself (the far plane).
pub struct ShadowMap {
    depth: DepthBuffer,
    depth_scale: f32,
}

impl ShadowMap {
    pub fn new(resolution: ShadowResolution) -> Self {
        let depth = DepthBuffer::new(resolution.width, resolution.height, resolution.depth_scale);
        return Self { depth, depth_scale: resolution.depth_scale };
    }

    pub fn width(&self) -> u32 {
        return self.depth.width;
    }

    pub fn height(&self) -> u32 {
        return self.depth.height;
    }

    pub fn depth_scale(&self) -> f32 {
        return self.depth_scale;
    }

    pub fn depth(&self) -> &DepthBuffer {
        return &self.depth;
    }

    /// Resets every texel to the far plane sentinel.
    pub fn clear(&mut self) {
        self.depth.reset(self.depth_scale);
    }

    /// Depth-only rasterization of one triangle given in texel space.
    /// Returns the number of texels written, or None for a degenerate triangle.
    fn rasterize(&mut self, p0: Vector3<f32>, p1: Vector3<f32>, p2: Vector3<f32>) -> Option<u64> {
        let (width, height) = (self.width(), self.height());
        let depth = &mut self.depth;
        let mut samples = 0;
        let covered = rasterize_coverage(p0, p1, p2, width, height, |x, y, bar_coord| {
            let z_value = bar_coord.dot(&vector![p0.z, p1.z, p2.z]);
            if depth.test_and_set(x, y, z_value) {
                samples += 1;
            }
        });
        if !covered {
            return None;
        }
        return Some(samples);
    }

    /// Bilinear depth lookup at texel-space (x, y). Coordinates are clamped to the outermost
    /// texel centers, so lookups off the map return edge depths.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let (width, height) = (self.width(), self.height());
        let x = x.clamp(0.5, width as f32 - 0.5);
        let y = y.clamp(0.5, height as f32 - 0.5);

        let x1 = (x - 0.5).floor() + 0.5;
        let y1 = (y - 0.5).floor() + 0.5;
        let j1 = (x1 - 0.5) as u32;
        let i1 = (y1 - 0.5) as u32;
        let j2 = (j1 + 1).min(width - 1);
        let i2 = (i1 + 1).min(height - 1);

        let q11 = self.depth.get(j1, i1);
        let q21 = self.depth.get(j2, i1);
        let q12 = self.depth.get(j1, i2);
        let q22 = self.depth.get(j2, i2);

        let wx = x - x1;
        let wy = y - y1;
        let bottom = q11 * (1.0 - wx) + q21 * wx;
        let top = q12 * (1.0 - wx) + q22 * wx;
        return bottom * (1.0 - wy) + top * wy;
    }
}

/// Light view and the orthographic projection fitted for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpace {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    /// Camera view space -> light clip space.
    view_to_light_clip: Matrix4<f32>,
    width: u32,
    height: u32,
    depth_scale: f32,
}

impl LightSpace {
    /// Fits the light projection around the camera frustum with a `margin` fraction of slack.
    pub fn fit(
        camera: &Camera,
        light: &DirectionalLight,
        margin: f32,
        resolution: ShadowResolution,
    ) -> Result<Self> {
        let camera_view = camera.view_matrix()?;
        let light_view = light.view_matrix()?;
        let (min, max) = light_space_bounds(camera, &camera_view, &light_view, margin)?;
        let projection = orthographic_matrix(min, max)?;
        let camera_view_inv = camera_view
            .try_inverse()
            .ok_or(RenderError::DegenerateView { what: "camera" })?;
        return Ok(Self {
            view: light_view,
            projection,
            view_to_light_clip: projection * light_view * camera_view_inv,
            width: resolution.width,
            height: resolution.height,
            depth_scale: resolution.depth_scale,
        });
    }

    /// Light NDC to texel space: x, y in [0, width] x [0, height], z in [0, depth_scale].
    pub fn ndc_to_texel(&self, ndc: Vector3<f32>) -> Vector3<f32> {
        return vector![
            (ndc.x * 0.5 + 0.5) * self.width as f32,
            (ndc.y * 0.5 + 0.5) * self.height as f32,
            (ndc.z * 0.5 + 0.5) * self.depth_scale
        ];
    }

    /// Camera view-space position to shadow map texel space.
    pub fn view_to_texel(&self, view_position: Vector3<f32>) -> Vector3<f32> {
        return self.ndc_to_texel(transform_point(&self.view_to_light_clip, view_position));
    }
}

/// Axis aligned box around the camera frustum in light view space, grown by `margin` of its size
/// (half on each side).
pub fn light_space_bounds(
    camera: &Camera,
    camera_view: &Matrix4<f32>,
    light_view: &Matrix4<f32>,
    margin: f32,
) -> Result<(Vector3<f32>, Vector3<f32>)> {
    let camera_view_inv = camera_view
        .try_inverse()
        .ok_or(RenderError::DegenerateView { what: "camera" })?;
    let camera_to_light = light_view * camera_view_inv;

    let corners = camera.frustum_corners();
    let mut min = Vector3::repeat(f32::INFINITY);
    let mut max = Vector3::repeat(f32::NEG_INFINITY);
    for corner in corners.iter() {
        let p = transform_point(&camera_to_light, *corner);
        min = min.inf(&p);
        max = max.sup(&p);
    }

    let slack = (max - min) * (margin * 0.5);
    return Ok((min - slack, max + slack));
}

/// Renders `mesh` into `map` from the light. The map is cleared first, and left untouched if the
/// light space cannot be built.
pub fn render_shadow_map(
    map: &mut ShadowMap,
    mesh: &Mesh,
    model: &Matrix4<f32>,
    camera: &Camera,
    light: &DirectionalLight,
    margin: f32,
    stats: &mut FrameStats,
) -> Result<LightSpace> {
    let resolution = ShadowResolution {
        width: map.width(),
        height: map.height(),
        depth_scale: map.depth_scale(),
    };
    let light_space = LightSpace::fit(camera, light, margin, resolution)?;
    map.clear();

    let light_mvp = light_space.projection * light_space.view * model;
    let texel_positions: Vec<Vector3<f32>> = mesh
        .vertices()
        .iter()
        .map(|v| light_space.ndc_to_texel(transform_point(&light_mvp, v.position)))
        .collect();

    for triangle in mesh.triangles() {
        let [p0, p1, p2] = triangle.map(|i| texel_positions[i]);
        match map.rasterize(p0, p1, p2) {
            Some(samples) => stats.shadow_samples += samples,
            None => stats.shadow_degenerate_triangles += 1,
        }
    }
    return Ok(light_space);
}

/// Per-fragment shadow test against a filled map.
pub struct ShadowLookup<'a> {
    pub map: &'a ShadowMap,
    pub light_space: &'a LightSpace,
}

impl<'a> ShadowLookup<'a> {
    /// True if the stored depth differs from the fragment's light depth by more than `bias`.
    pub fn is_in_shadow(&self, view_position: Vector3<f32>, bias: f32) -> bool {
        let texel = self.light_space.view_to_texel(view_position);
        let stored = self.map.sample_bilinear(texel.x, texel.y);
        return (texel.z - stored).abs() > bias;
    }
}

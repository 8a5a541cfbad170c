//! Triangle fill: edge-function coverage, perspective-correct attribute interpolation, depth
//! test and per-pixel shading.

use nalgebra as na;
use na::{vector, Matrix4, Vector2, Vector3};

use super::buffer::{ColorBuffer, DepthBuffer};
use super::driver::FrameStats;
use super::geometry::TransformedVertex;
use super::model::{Material, Mesh};
use super::shadow::ShadowLookup;
use super::texture::Texture;
use super::util::{edge_function, interpolate, interpolate_perspective, transform_vector, Color};
use crate::error::{RenderError, Result};

/// Triangles with a screen-space area at or below this are skipped.
pub const DEGENERATE_AREA: f32 = 1e-5;

/// Calls `fragment(x, y, barycentric)` for every pixel whose center lies inside the triangle.
/// Iteration is limited to the part of the bounding box that lies inside `width` x `height`.
/// Returns false, without visiting anything, for degenerate or back-facing triangles.
pub fn rasterize_coverage<F>(
    p0: Vector3<f32>,
    p1: Vector3<f32>,
    p2: Vector3<f32>,
    width: u32,
    height: u32,
    mut fragment: F,
) -> bool
where
    F: FnMut(u32, u32, Vector3<f32>),
{
    let (a, b, c) = (p0.xy(), p1.xy(), p2.xy());
    let area = edge_function(a, b, c);
    if !(area > DEGENERATE_AREA) {
        return false;
    }

    let start_x = (a.x.min(b.x).min(c.x).floor() as i64).max(0);
    let end_x = (a.x.max(b.x).max(c.x).ceil() as i64).min(width as i64 - 1);
    let start_y = (a.y.min(b.y).min(c.y).floor() as i64).max(0);
    let end_y = (a.y.max(b.y).max(c.y).ceil() as i64).min(height as i64 - 1);

    for y in start_y..=end_y {
        for x in start_x..=end_x {
            let p: Vector2<f32> = vector![x as f32 + 0.5, y as f32 + 0.5];
            let w0 = edge_function(b, c, p);
            let w1 = edge_function(c, a, p);
            let w2 = edge_function(a, b, p);
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                fragment(x as u32, y as u32, vector![w0, w1, w2] / area);
            }
        }
    }
    return true;
}

/// Frame constants for the lit branch. Colors are linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    pub texture_enabled: bool,
    pub lighting_enabled: bool,
    pub ambient_color: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub light_intensity: f32,
    /// Unit direction towards the light, in view space.
    pub light_direction: Vector3<f32>,
    /// Multiplier on the material shininess.
    pub shininess: f32,
    pub specular_strength: f32,
    pub shadow_bias: f32,
}

/// Blinn-Phong with ambient, diffuse and specular terms. Fragments in shadow get ambient only.
pub fn shade(
    normal: Vector3<f32>,
    base_color: Color,
    view_position: Vector3<f32>,
    in_shadow: bool,
    params: &ShadingParams,
    material: &Material,
) -> Color {
    let base = base_color.xyz();
    let ambient = params.ambient_color.component_mul(&base);
    if in_shadow {
        return ambient.map(|c| c.clamp(0.0, 1.0)).push(base_color.w);
    }

    let light_direction = params.light_direction;
    let diffuse_coef = normal.dot(&light_direction).max(0.0);
    let diffuse = base.component_mul(&params.light_color) * (diffuse_coef * params.light_intensity);

    let view_direction = -view_position.normalize();
    let half_vector = (light_direction + view_direction).normalize();
    let spec_coef = normal
        .dot(&half_vector)
        .max(0.0)
        .powf(material.shininess * params.shininess);
    let mut specular =
        params.light_color * (params.light_intensity * spec_coef * params.specular_strength);
    if let Some(metallic) = material.metallic {
        // Dielectric surfaces reflect a faint white, metals reflect their own color.
        let tint = Vector3::repeat(0.04).lerp(&base, metallic);
        specular = specular.component_mul(&tint);
    }

    let lit = ambient + diffuse + specular;
    return lit.map(|c| c.clamp(0.0, 1.0)).push(base_color.w);
}

/// Textures the enabled branches need, looked up once before any pixel is touched.
struct ResolvedTextures<'a> {
    base_color: Option<&'a Texture>,
    normal_map: Option<&'a Texture>,
}

fn resolve_textures<'a>(material: &'a Material, params: &ShadingParams) -> Result<ResolvedTextures<'a>> {
    if !params.texture_enabled {
        return Ok(ResolvedTextures { base_color: None, normal_map: None });
    }
    let base_color = material
        .base_color
        .as_ref()
        .ok_or(RenderError::MissingResource { resource: "base color texture" })?;
    let mut normal_map = None;
    if params.lighting_enabled {
        normal_map = Some(
            material
                .normal_map
                .as_ref()
                .ok_or(RenderError::MissingResource { resource: "normal map" })?,
        );
    }
    return Ok(ResolvedTextures { base_color: Some(base_color), normal_map });
}

/// Fails with `MissingResource` if the enabled flags need a texture the material lacks.
pub fn check_resources(material: &Material, params: &ShadingParams) -> Result<()> {
    resolve_textures(material, params)?;
    return Ok(());
}

/// The color fill pass over one mesh.
pub struct FillPass<'a> {
    pub mesh: &'a Mesh,
    /// Output of the geometry stage for `mesh`, same order.
    pub vertices: &'a [TransformedVertex],
    pub material: &'a Material,
    /// View * model, applied to normal map normals.
    pub model_view: Matrix4<f32>,
    pub params: &'a ShadingParams,
    pub shadow: Option<ShadowLookup<'a>>,
}

impl<'a> FillPass<'a> {
    /// Rasterizes every triangle into `color`, keeping the nearest fragment per pixel in `depth`.
    /// Missing textures are reported before anything is written.
    pub fn run(&self, color: &mut ColorBuffer, depth: &mut DepthBuffer, stats: &mut FrameStats) -> Result<()> {
        let textures = resolve_textures(self.material, self.params)?;
        debug_assert_eq!(self.vertices.len(), self.mesh.vertices().len());
        debug_assert!(color.width == depth.width && color.height == depth.height);

        let (width, height) = (color.width, color.height);
        for triangle in self.mesh.triangles() {
            let [v0, v1, v2] = triangle.map(|i| self.vertices[i]);
            if !(v0.in_front() && v1.in_front() && v2.in_front()) {
                stats.culled_triangles += 1;
                continue;
            }

            let covered = rasterize_coverage(v0.screen, v1.screen, v2.screen, width, height, |x, y, bar_coord| {
                // Post-divide NDC z is affine in screen space, so no perspective correction here.
                let z_value = interpolate(bar_coord, [v0.screen.z, v1.screen.z, v2.screen.z]);
                if !depth.test_and_set(x, y, z_value) {
                    return;
                }
                let (fragment_color, in_shadow) =
                    self.shade_fragment(triangle, [v0, v1, v2], bar_coord, &textures);
                color.set(x, y, fragment_color);
                stats.fragments_written += 1;
                if in_shadow {
                    stats.fragments_in_shadow += 1;
                }
            });
            if !covered {
                stats.degenerate_triangles += 1;
            }
        }
        return Ok(());
    }

    /// Color of one fragment, plus whether the shadow test failed for it.
    fn shade_fragment(
        &self,
        triangle: &[usize; 3],
        vertices: [TransformedVertex; 3],
        bar_coord: Vector3<f32>,
        textures: &ResolvedTextures,
    ) -> (Color, bool) {
        let mesh_vertices = triangle.map(|i| self.mesh.vertices()[i]);
        let factors = vector![
            vertices[0].perspective_factor,
            vertices[1].perspective_factor,
            vertices[2].perspective_factor
        ];
        let uv = interpolate_perspective(bar_coord, factors, mesh_vertices.map(|v| v.uv));

        let base_color = match textures.base_color {
            Some(texture) => texture.sample_bilinear(uv),
            None => {
                let mut c = interpolate_perspective(bar_coord, factors, mesh_vertices.map(|v| v.color));
                c.w = 1.0;
                c
            }
        };
        if !self.params.lighting_enabled {
            return (base_color, false);
        }

        let view_position =
            interpolate_perspective(bar_coord, factors, vertices.map(|v| v.view_position));
        let normal = match textures.normal_map {
            Some(normal_map) => {
                let texel = normal_map.sample_bilinear(uv);
                let tangent_normal = (texel.xyz() * 2.0 - Vector3::repeat(1.0)).normalize();
                transform_vector(&self.model_view, tangent_normal).normalize()
            }
            None => interpolate_perspective(bar_coord, factors, vertices.map(|v| v.view_normal)).normalize(),
        };

        let in_shadow = match &self.shadow {
            Some(lookup) => lookup.is_in_shadow(view_position, self.params.shadow_bias),
            None => false,
        };
        let lit = shade(normal, base_color, view_position, in_shadow, self.params, self.material);
        return (lit, in_shadow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::util::rgba;
    use approx::assert_relative_eq;

    fn params() -> ShadingParams {
        return ShadingParams {
            texture_enabled: false,
            lighting_enabled: true,
            ambient_color: Vector3::repeat(0.2),
            light_color: Vector3::repeat(1.0),
            light_intensity: 1.0,
            light_direction: vector![0.0, 0.0, -1.0],
            shininess: 1.0,
            specular_strength: 0.0,
            shadow_bias: 0.005,
        };
    }

    #[test]
    fn coverage_is_clamped_to_buffer() {
        let mut visited = Vec::new();
        let covered = rasterize_coverage(
            vector![-10.0, -10.0, 0.0],
            vector![-10.0, 30.0, 0.0],
            vector![30.0, -10.0, 0.0],
            4,
            3,
            |x, y, _| visited.push((x, y)),
        );
        assert!(covered);
        assert_eq!(visited.len(), 12);
        assert!(visited.iter().all(|&(x, y)| x < 4 && y < 3));
    }

    #[test]
    fn coverage_weights_sum_to_one() {
        rasterize_coverage(
            vector![1.0, 1.0, 0.0],
            vector![2.0, 9.0, 0.0],
            vector![9.0, 3.0, 0.0],
            16,
            16,
            |_, _, bar_coord| {
                assert!(bar_coord.iter().all(|&w| (0.0..=1.0).contains(&w)));
                assert_relative_eq!(bar_coord.sum(), 1.0, epsilon = 1e-5);
            },
        );
    }

    #[test]
    fn degenerate_and_back_facing_triangles_are_skipped() {
        let mut count = 0;
        let collinear = rasterize_coverage(
            vector![0.0, 0.0, 0.0],
            vector![2.0, 2.0, 0.0],
            vector![4.0, 4.0, 0.0],
            8,
            8,
            |_, _, _| count += 1,
        );
        let reversed = rasterize_coverage(
            vector![0.0, 0.0, 0.0],
            vector![6.0, 0.0, 0.0],
            vector![0.0, 6.0, 0.0],
            8,
            8,
            |_, _, _| count += 1,
        );
        assert!(!collinear);
        assert!(!reversed);
        assert_eq!(count, 0);
    }

    #[test]
    fn shadowed_fragment_is_ambient_only() {
        let base = rgba(0.5, 1.0, 0.25, 1.0);
        let material = Material::new();
        let lit = shade(vector![0.0, 0.0, -1.0], base, vector![0.0, 0.0, 5.0], true, &params(), &material);
        assert_relative_eq!(lit, rgba(0.1, 0.2, 0.05, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn diffuse_follows_lambert() {
        let base = rgba(0.5, 0.5, 0.5, 1.0);
        let material = Material::new();
        let facing = shade(vector![0.0, 0.0, -1.0], base, vector![0.0, 0.0, 5.0], false, &params(), &material);
        assert_relative_eq!(facing, rgba(0.6, 0.6, 0.6, 1.0), epsilon = 1e-6);

        // Facing away from the light leaves only ambient.
        let away = shade(vector![0.0, 0.0, 1.0], base, vector![0.0, 0.0, 5.0], false, &params(), &material);
        assert_relative_eq!(away, rgba(0.1, 0.1, 0.1, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn metallic_tints_specular_towards_base() {
        let mut params = params();
        params.specular_strength = 1.0;
        params.ambient_color = Vector3::zeros();
        // Light and viewer both on the normal, so the specular term peaks.
        let base = rgba(1.0, 0.0, 0.0, 1.0);
        let normal = vector![0.0, 0.0, -1.0];
        let view_position = vector![0.0, 0.0, 5.0];

        let plain = shade(normal, base, view_position, false, &params, &Material::new());
        let metal = shade(normal, base, view_position, false, &params, &Material::new().with_metallic(1.0));
        // Plain: diffuse red + white specular, clamped.
        assert_relative_eq!(plain, rgba(1.0, 1.0, 1.0, 1.0), epsilon = 1e-6);
        // Full metal: specular is tinted red, green and blue stay dark.
        assert_relative_eq!(metal, rgba(1.0, 0.0, 0.0, 1.0), epsilon = 1e-6);
    }
}

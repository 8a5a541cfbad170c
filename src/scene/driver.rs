//! Per-frame orchestration: owns the buffers, the render toggles and the tick accumulator, and
//! runs either the wireframe pass or the shadow + fill passes for a scene.

use nalgebra as na;
use na::{Matrix4, Vector3};
use serde::Deserialize;

use super::buffer::{ColorBuffer, DepthBuffer};
use super::camera::{Camera, DirectionalLight};
use super::geometry::transform_vertices;
use super::model::{Material, Mesh};
use super::raster::{check_resources, FillPass, ShadingParams};
use super::shadow::{render_shadow_map, ShadowLookup, ShadowMap};
use super::util::{transform_vector, Color};
use super::wireframe::draw_wireframe;
use crate::config::Settings;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum RenderMode {
    Wireframe,
    Shaded,
}

/// Everything a frame reads. Nothing in here is modified by rendering.
pub struct Scene {
    pub mesh: Mesh,
    pub model: Matrix4<f32>,
    pub camera: Camera,
    pub light: DirectionalLight,
    pub material: Material,
}

/// Counters collected while rendering one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles: u64,
    /// Triangles with a vertex on or behind the camera plane.
    pub culled_triangles: u64,
    /// Zero-area or back-facing triangles in the fill pass.
    pub degenerate_triangles: u64,
    pub shadow_degenerate_triangles: u64,
    /// Shadow map texels written, counting overwrites.
    pub shadow_samples: u64,
    /// Fill pass color buffer writes, counting overwrites.
    pub fragments_written: u64,
    pub fragments_in_shadow: u64,
    pub edges_drawn: u64,
    pub culled_edges: u64,
    /// Wireframe pass color buffer writes, counting overwrites.
    pub line_pixels: u64,
}

pub struct FrameDriver {
    settings: Settings,
    color: ColorBuffer,
    depth: DepthBuffer,
    shadow_map: ShadowMap,
    /// Seconds accumulated since the last executed frame.
    elapsed: f32,
}

impl FrameDriver {
    pub fn new(settings: Settings) -> Self {
        return Self {
            color: ColorBuffer::new(settings.width, settings.height),
            depth: DepthBuffer::new(settings.width, settings.height, f32::INFINITY),
            shadow_map: ShadowMap::new(settings.shadow_resolution),
            settings,
            elapsed: 0.0,
        };
    }

    pub fn settings(&self) -> &Settings {
        return &self.settings;
    }

    pub fn color_buffer(&self) -> &ColorBuffer {
        return &self.color;
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        return &self.depth;
    }

    pub fn shadow_map(&self) -> &ShadowMap {
        return &self.shadow_map;
    }

    pub fn render_mode(&self) -> RenderMode {
        return self.settings.render_mode;
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.settings.render_mode = mode;
    }

    pub fn toggle_render_mode(&mut self) {
        self.settings.render_mode = match self.settings.render_mode {
            RenderMode::Wireframe => RenderMode::Shaded,
            RenderMode::Shaded => RenderMode::Wireframe,
        };
        log::info!("Render mode - {:?}", self.settings.render_mode);
    }

    pub fn set_texture_enabled(&mut self, enabled: bool) {
        self.settings.texture_enabled = enabled;
    }

    pub fn toggle_texture(&mut self) {
        self.settings.texture_enabled = !self.settings.texture_enabled;
        log::info!("Texture - {}", self.settings.texture_enabled);
    }

    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.settings.lighting_enabled = enabled;
    }

    pub fn toggle_lighting(&mut self) {
        self.settings.lighting_enabled = !self.settings.lighting_enabled;
        log::info!("Lighting - {}", self.settings.lighting_enabled);
    }

    /// Advances the frame clock by `dt` seconds and renders once `tick_interval` has accumulated.
    /// Returns None when the tick was skipped.
    pub fn tick(&mut self, dt: f32, scene: &Scene) -> Result<Option<FrameStats>> {
        self.elapsed += dt;
        if self.elapsed < self.settings.tick_interval {
            return Ok(None);
        }
        self.elapsed = 0.0;
        return self.render_frame(scene).map(Some);
    }

    /// Renders one frame into the color buffer. On error the color buffer holds the background
    /// and the frame is skipped, except for invalid settings, which are rejected before the
    /// clear.
    pub fn render_frame(&mut self, scene: &Scene) -> Result<FrameStats> {
        // Settings built in code skip the checks done when loading them.
        self.settings.validate()?;
        let mut stats = FrameStats {
            triangles: scene.mesh.triangles().len() as u64,
            ..Default::default()
        };
        let [r, g, b, a] = self.settings.background;
        self.color.clear(Color::new(r, g, b, a));

        let result = match self.settings.render_mode {
            RenderMode::Wireframe => self.render_wireframe(scene, &mut stats),
            RenderMode::Shaded => self.render_shaded(scene, &mut stats),
        };
        match result {
            Ok(()) => {
                log::debug!("{:?}", stats);
                return Ok(stats);
            }
            Err(err) => {
                log::warn!("Frame aborted - {}", err);
                return Err(err);
            }
        }
    }

    fn render_wireframe(&mut self, scene: &Scene, stats: &mut FrameStats) -> Result<()> {
        let view = scene.camera.view_matrix()?;
        let vertices = transform_vertices(
            &scene.mesh,
            &scene.model,
            &view,
            &scene.camera.projection_matrix(),
            self.color.width,
            self.color.height,
        );
        draw_wireframe(&scene.mesh, &vertices, &mut self.color, stats);
        return Ok(());
    }

    fn render_shaded(&mut self, scene: &Scene, stats: &mut FrameStats) -> Result<()> {
        let view = scene.camera.view_matrix()?;
        let params = self.shading_params(scene, &view);
        check_resources(&scene.material, &params)?;

        let light_space = render_shadow_map(
            &mut self.shadow_map,
            &scene.mesh,
            &scene.model,
            &scene.camera,
            &scene.light,
            self.settings.shadow_margin,
            stats,
        )?;

        self.depth.reset(f32::INFINITY);
        let vertices = transform_vertices(
            &scene.mesh,
            &scene.model,
            &view,
            &scene.camera.projection_matrix(),
            self.color.width,
            self.color.height,
        );
        let pass = FillPass {
            mesh: &scene.mesh,
            vertices: &vertices,
            material: &scene.material,
            model_view: view * scene.model,
            params: &params,
            shadow: Some(ShadowLookup { map: &self.shadow_map, light_space: &light_space }),
        };
        return pass.run(&mut self.color, &mut self.depth, stats);
    }

    fn shading_params(&self, scene: &Scene, view: &Matrix4<f32>) -> ShadingParams {
        let [ar, ag, ab] = self.settings.ambient_color;
        return ShadingParams {
            texture_enabled: self.settings.texture_enabled,
            lighting_enabled: self.settings.lighting_enabled,
            ambient_color: Vector3::new(ar, ag, ab),
            light_color: scene.light.color.xyz(),
            light_intensity: scene.light.intensity,
            // The light shines along its forward vector, shading wants the direction back to it.
            light_direction: -transform_vector(view, scene.light.pose.forward).normalize(),
            shininess: self.settings.shininess,
            specular_strength: self.settings.specular_strength,
            shadow_bias: self.settings.shadow_bias,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::scene::transform::Pose;
    use nalgebra::vector;

    fn settings() -> Settings {
        return Settings {
            width: 32,
            height: 32,
            shadow_resolution: crate::config::ShadowResolution { width: 32, height: 32, depth_scale: 1.0 },
            ..Default::default()
        };
    }

    fn scene() -> Scene {
        let pose = Pose::new(vector![0.0, 2.0, -6.0], vector![0.0, -0.3, 1.0], vector![0.0, 1.0, 0.0]);
        return Scene {
            mesh: Mesh::demo(1),
            model: Matrix4::identity(),
            camera: Camera { pose, fov_y: 60.0, aspect: 1.0, near: 0.1, far: 50.0 },
            light: DirectionalLight::new(Pose::new(
                vector![2.0, 6.0, -2.0],
                vector![-0.3, -1.0, 0.4],
                vector![0.0, 0.0, 1.0],
            )),
            material: Material::new(),
        };
    }

    #[test]
    fn tick_waits_for_interval() {
        let mut driver = FrameDriver::new(Settings { tick_interval: 0.5, ..settings() });
        let scene = scene();
        assert_eq!(driver.tick(0.2, &scene).unwrap(), None);
        assert_eq!(driver.tick(0.2, &scene).unwrap(), None);
        assert!(driver.tick(0.2, &scene).unwrap().is_some());
        // Accumulator starts over after a rendered frame.
        assert_eq!(driver.tick(0.2, &scene).unwrap(), None);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut driver = FrameDriver::new(settings());
        assert_eq!(driver.render_mode(), RenderMode::Wireframe);
        driver.toggle_render_mode();
        assert_eq!(driver.render_mode(), RenderMode::Shaded);
        driver.toggle_texture();
        driver.toggle_lighting();
        assert!(driver.settings().texture_enabled);
        assert!(driver.settings().lighting_enabled);
        driver.set_lighting_enabled(false);
        assert!(!driver.settings().lighting_enabled);
    }

    #[test]
    fn wireframe_draws_edges() {
        let mut driver = FrameDriver::new(settings());
        let stats = driver.render_frame(&scene()).unwrap();
        assert_eq!(stats.triangles, 14);
        assert_eq!(stats.edges_drawn + stats.culled_edges, 42);
        assert!(stats.line_pixels > 0);
        assert_eq!(stats.fragments_written, 0);
        let background = Color::new(1.0, 1.0, 1.0, 1.0);
        assert!(driver.color_buffer().pixels().iter().any(|&p| p != background));
    }

    #[test]
    fn shaded_demo_scene_renders() {
        let mut driver = FrameDriver::new(Settings {
            render_mode: RenderMode::Shaded,
            lighting_enabled: true,
            ..settings()
        });
        let stats = driver.render_frame(&scene()).unwrap();
        assert!(stats.shadow_samples > 0);
        assert!(stats.fragments_written > 0);
        assert!(driver.color_buffer().pixels().iter().all(|p| p.iter().all(|c| (0.0..=1.0).contains(c))));
    }

    #[test]
    fn empty_shadow_map_is_rejected() {
        let mut driver = FrameDriver::new(Settings {
            render_mode: RenderMode::Shaded,
            lighting_enabled: true,
            shadow_resolution: crate::config::ShadowResolution { width: 0, height: 0, depth_scale: 1.0 },
            ..settings()
        });
        let result = driver.render_frame(&scene());
        assert!(matches!(result, Err(RenderError::InvalidSettings { field: "shadow_resolution", .. })));
    }

    #[test]
    fn missing_texture_aborts_before_drawing() {
        let mut driver = FrameDriver::new(Settings {
            render_mode: RenderMode::Shaded,
            texture_enabled: true,
            ..settings()
        });
        let result = driver.render_frame(&scene());
        assert!(matches!(result, Err(RenderError::MissingResource { resource: "base color texture" })));
        let background = Color::new(1.0, 1.0, 1.0, 1.0);
        assert!(driver.color_buffer().pixels().iter().all(|&p| p == background));
    }
}

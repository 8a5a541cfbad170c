use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{RenderError, Result};
use crate::scene::RenderMode;

/// Shadow map size. `depth_scale` is the range light-space depth gets remapped to, it is not
/// a texel count.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ShadowResolution {
    pub width: u32,
    pub height: u32,
    pub depth_scale: f32,
}

impl Default for ShadowResolution {
    fn default() -> Self {
        return Self {
            width: 512,
            height: 512,
            depth_scale: 1.0,
        };
    }
}

/// Renderer settings. Every field has a default, so a settings file only needs to list what
/// it overrides, e.g. `(width: 640, height: 480, render_mode: Shaded)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: u32,
    pub height: u32,
    /// Clear color of the color buffer, linear RGBA.
    pub background: [f32; 4],
    pub render_mode: RenderMode,
    pub texture_enabled: bool,
    pub lighting_enabled: bool,
    /// Max allowed difference between fragment light depth and shadow map depth.
    pub shadow_bias: f32,
    /// Multiplier on the material shininess exponent.
    pub shininess: f32,
    pub specular_strength: f32,
    pub ambient_color: [f32; 3],
    pub shadow_resolution: ShadowResolution,
    /// Fraction of the light-space box size added around it before building the light projection.
    pub shadow_margin: f32,
    /// Seconds between executed frames, 0 renders on every tick.
    pub tick_interval: f32,
    pub vertex_color_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        return Self {
            width: 800,
            height: 800,
            background: [1.0, 1.0, 1.0, 1.0],
            render_mode: RenderMode::Wireframe,
            texture_enabled: false,
            lighting_enabled: false,
            shadow_bias: 0.005,
            shininess: 1.0,
            specular_strength: 0.5,
            ambient_color: [0.2, 0.2, 0.2],
            shadow_resolution: ShadowResolution::default(),
            shadow_margin: 0.1,
            tick_interval: 0.5,
            vertex_color_seed: 0,
        };
    }
}

impl Settings {
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let settings: Settings = ron::from_str(source)?;
        settings.validate()?;
        return Ok(settings);
    }

    /// Rejects values the passes cannot render with: empty color or shadow buffers and
    /// non-positive depth ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field, reason| Err(RenderError::InvalidSettings { field, reason });
        if self.width == 0 || self.height == 0 {
            return invalid("width/height", "must be non-zero");
        }
        let shadow = &self.shadow_resolution;
        if shadow.width == 0 || shadow.height == 0 {
            return invalid("shadow_resolution", "must be non-zero");
        }
        if !(shadow.depth_scale.is_finite() && shadow.depth_scale > 0.0) {
            return invalid("shadow_resolution.depth_scale", "must be finite and positive");
        }
        if !(self.shadow_margin.is_finite() && self.shadow_margin >= 0.0) {
            return invalid("shadow_margin", "must be finite and not negative");
        }
        if self.tick_interval.is_nan() || self.tick_interval < 0.0 {
            return invalid("tick_interval", "must not be negative");
        }
        return Ok(());
    }

    pub fn from_ron_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path.as_ref())?;
        let settings = Self::from_ron_str(&source)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        return Ok(settings);
    }
}

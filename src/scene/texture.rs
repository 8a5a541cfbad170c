use std::path::Path;

use image::{ImageBuffer, Rgba, Rgba32FImage};
use nalgebra as na;
use na::{vector, Vector2};

use super::util::Color;
use crate::error::{RenderError, Result};

/// Float RGBA texture sampled by normalized uv, where (0, 0) is the bottom left corner.
#[derive(Debug, Clone)]
pub struct Texture {
    image: Rgba32FImage,
}

impl Texture {
    /// Fails on an image without texels.
    pub fn new(image: Rgba32FImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::EmptyTexture { width: image.width(), height: image.height() });
        }
        return Ok(Self { image });
    }

    /// Single-color texture.
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self> {
        let pixel = Rgba([color.x, color.y, color.z, color.w]);
        return Self::new(ImageBuffer::from_pixel(width, height, pixel));
    }

    /// Texture filled by `f(x, y)` with image coordinates, row 0 at the top.
    pub fn from_fn<F: FnMut(u32, u32) -> Color>(width: u32, height: u32, mut f: F) -> Result<Self> {
        let image = ImageBuffer::from_fn(width, height, |x, y| {
            let c = f(x, y);
            Rgba([c.x, c.y, c.z, c.w])
        });
        return Self::new(image);
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| RenderError::TextureLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let texture = Self::new(image.to_rgba32f())?;
        log::info!("Loaded texture {} ({}x{})", path.display(), texture.width(), texture.height());
        return Ok(texture);
    }

    pub fn width(&self) -> u32 {
        return self.image.width();
    }

    pub fn height(&self) -> u32 {
        return self.image.height();
    }

    /// Texel in image coordinates, clamped to the edge.
    fn texel(&self, x: i64, y: i64) -> Color {
        let x = x.clamp(0, self.width() as i64 - 1) as u32;
        let y = y.clamp(0, self.height() as i64 - 1) as u32;
        let p = self.image.get_pixel(x, y).0;
        return vector![p[0], p[1], p[2], p[3]];
    }

    /// Bilinear sample between the four nearest texel centers, clamped at the border.
    pub fn sample_bilinear(&self, uv: Vector2<f32>) -> Color {
        // Image rows go top to bottom, v goes bottom to top.
        let x = uv.x * self.width() as f32 - 0.5;
        let y = (1.0 - uv.y) * self.height() as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.texel(x0, y0) * (1.0 - fx) + self.texel(x0 + 1, y0) * fx;
        let bottom = self.texel(x0, y0 + 1) * (1.0 - fx) + self.texel(x0 + 1, y0 + 1) * fx;
        return top * (1.0 - fy) + bottom * fy;
    }
}

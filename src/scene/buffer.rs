//! Frame-sized buffers. Both use a flat row-major layout with (0, 0) at the bottom left.

use super::util::Color;

/// RGBA float render target.
pub struct ColorBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl ColorBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let n_pixels = (width * height) as usize;
        return Self { width, height, pixels: vec![Color::zeros(); n_pixels] };
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({}, {}) outside of the buffer", x, y);
        return (x + y * self.width) as usize;
    }

    /// Overwrites every pixel with `color`.
    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        return self.pixels[self.index(x, y)];
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    pub fn pixels(&self) -> &[Color] {
        return &self.pixels[..];
    }

    /// 8-bit RGBA copy with the first row at the top, ready to be shown or saved.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.pixels.len() * 4);
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let color = self.get(x, y);
                for channel in color.iter() {
                    data.push((channel.clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }
        return data;
    }
}

/// Float depth buffer where smaller values are nearer.
pub struct DepthBuffer {
    pub width: u32,
    pub height: u32,
    values: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32, height: u32, value: f32) -> Self {
        let n_pixels = (width * height) as usize;
        return Self { width, height, values: vec![value; n_pixels] };
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "texel ({}, {}) outside of the buffer", x, y);
        return (x + y * self.width) as usize;
    }

    pub fn reset(&mut self, value: f32) {
        self.values.fill(value);
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        return self.values[self.index(x, y)];
    }

    /// Stores `depth` if it is strictly nearer than the current value.
    /// Returns false if the fragment lost the test and nothing changed.
    pub fn test_and_set(&mut self, x: u32, y: u32, depth: f32) -> bool {
        let index = self.index(x, y);
        if depth < self.values[index] {
            self.values[index] = depth;
            return true;
        }
        return false;
    }

    pub fn values(&self) -> &[f32] {
        return &self.values[..];
    }
}

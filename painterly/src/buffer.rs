//! Output map buffers

use glam::Vec3;

/// Default normal map pixel: flat +Z in packed form
pub const FLAT_NORMAL: [f32; 4] = [0.5, 0.5, 1.0, 1.0];

/// Default color map pixel
pub const NEUTRAL_GRAY: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Floating point RGBA buffer
#[derive(Debug, Clone, PartialEq)]
pub struct MapBuffer {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RGBA pixel data (4 floats per pixel, row-major, row 0 at v = 0)
    pub pixels: Vec<f32>,
}

impl MapBuffer {
    /// Create a buffer filled with a single color
    pub fn filled(width: u32, height: u32, color: [f32; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Get pixel at (x, y)
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> [f32; 4] {
        let idx = self.index(x, y);
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Set pixel at (x, y)
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        let idx = self.index(x, y);
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    /// Get mutable slice of pixel data at (x, y)
    #[inline]
    pub fn pixel_mut(&mut self, x: u32, y: u32) -> &mut [f32] {
        let idx = self.index(x, y);
        &mut self.pixels[idx..idx + 4]
    }

    /// Number of pixels that differ from `color`
    pub fn count_differing(&self, color: [f32; 4]) -> usize {
        self.pixels
            .chunks_exact(4)
            .filter(|px| **px != color)
            .count()
    }

    /// Quantize to 8-bit RGBA with row 0 at the top of the image
    pub fn to_rgba8_top_down(&self) -> Vec<u8> {
        let row_len = self.width as usize * 4;
        let mut out = Vec::with_capacity(self.pixels.len());
        for row in self.pixels.chunks_exact(row_len.max(1)).rev() {
            out.extend(row.iter().map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8));
        }
        out
    }
}

/// The two maps produced by a run, allocated once at a fixed resolution
#[derive(Debug, Clone, PartialEq)]
pub struct PainterlyMaps {
    pub normal: MapBuffer,
    pub color: MapBuffer,
}

impl PainterlyMaps {
    pub fn new(resolution: u32) -> Self {
        Self {
            normal: MapBuffer::filled(resolution, resolution, FLAT_NORMAL),
            color: MapBuffer::filled(resolution, resolution, NEUTRAL_GRAY),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.color.width
    }
}

/// Pack a unit normal into [0, 1] color components with opaque alpha
pub fn pack_normal(normal: Vec3) -> [f32; 4] {
    let n = normal.normalize_or_zero();
    [n.x * 0.5 + 0.5, n.y * 0.5 + 0.5, n.z * 0.5 + 0.5, 1.0]
}

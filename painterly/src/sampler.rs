//! Source texture sampling
//!
//! One texture is cached per run and shared by every object: the first
//! object whose material carries a usable image wins. Objects without a
//! cached texture paint with their material's flat color.

use glam::Vec2;
use rand::Rng;

use crate::error::{PainterlyError, Result};
use crate::mesh::{MeshObject, NEUTRAL_GRAY, SourceImage};

/// Cached RGBA float image addressed by UV
#[derive(Debug, Clone, PartialEq)]
pub struct TextureCache {
    width: u32,
    height: u32,
    pixels: Vec<f32>,
}

impl TextureCache {
    /// Cache a flattened RGBA image, checking that its size matches
    pub fn new(pixels: Vec<f32>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PainterlyError::TextureCache {
                reason: format!("empty image ({width}x{height})"),
            });
        }

        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(PainterlyError::TextureCache {
                reason: format!(
                    "{width}x{height} image needs {expected} values, got {}",
                    pixels.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn from_source(image: &SourceImage) -> Result<Self> {
        Self::new(image.pixels.clone(), image.width, image.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Point-sample the RGB color at `uv`.
    ///
    /// Coordinates are clamped to the image; any failed lookup yields
    /// neutral gray.
    pub fn sample(&self, uv: Vec2) -> [f32; 3] {
        let x = texel(uv.x, self.width);
        let y = texel(uv.y, self.height);
        let idx = (y * self.width as usize + x) * 4;

        match self.pixels.get(idx..idx + 3) {
            Some(&[r, g, b]) => [r, g, b],
            _ => NEUTRAL_GRAY,
        }
    }

    /// Find the texture shared by this run.
    ///
    /// Images that fail to cache are returned as errors alongside the index
    /// of the object that carried them; the search continues past them.
    pub fn resolve_shared(objects: &[MeshObject]) -> (Option<Self>, Vec<(usize, PainterlyError)>) {
        let mut failures = Vec::new();

        for (index, object) in objects.iter().enumerate() {
            let Some(image) = &object.material.image else {
                continue;
            };

            match Self::from_source(image) {
                Ok(cache) => {
                    tracing::info!(
                        object = %object.name,
                        "Cached texture: {}x{}",
                        cache.width,
                        cache.height
                    );
                    return (Some(cache), failures);
                }
                Err(err) => {
                    tracing::warn!(object = %object.name, "Error caching texture: {}", err);
                    failures.push((index, err));
                }
            }
        }

        tracing::info!("No usable texture found, using material colors");
        (None, failures)
    }
}

fn texel(coord: f32, size: u32) -> usize {
    // NaN casts to 0
    let scaled = (coord * size as f32).floor() as i64;
    scaled.clamp(0, size as i64 - 1) as usize
}

/// Where stroke base colors come from for one object
#[derive(Debug, Clone, Copy)]
pub enum ColorSource<'a> {
    /// Sample the shared texture at the pixel's UV
    Texture(&'a TextureCache),
    /// Flat material color
    Flat([f32; 3]),
}

impl ColorSource<'_> {
    pub fn color_at(&self, uv: Vec2) -> [f32; 3] {
        match self {
            ColorSource::Texture(cache) => cache.sample(uv),
            ColorSource::Flat(color) => *color,
        }
    }
}

/// Add independent uniform noise in [-magnitude, magnitude] to each channel.
///
/// Channels are clamped to [0, 1] and alpha is opaque.
pub fn jitter<R: Rng + ?Sized>(color: [f32; 3], magnitude: f32, rng: &mut R) -> [f32; 4] {
    let mut out = [0.0, 0.0, 0.0, 1.0];
    for (channel, &value) in out.iter_mut().zip(color.iter()) {
        let offset = if magnitude > 0.0 {
            rng.random_range(-magnitude..=magnitude)
        } else {
            0.0
        };
        *channel = (value + offset).clamp(0.0, 1.0);
    }
    out
}

//! Pipeline configuration

use serde::{Deserialize, Serialize};

use crate::error::{PainterlyError, Result};

/// Threshold used when the configured angle is out of range
pub const DEFAULT_ANGLE_THRESHOLD: f32 = 10.0;

/// Which ownership a stroke is masked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    /// Strokes stay inside their face region
    #[default]
    Region,
    /// Strokes stay inside their object but may cross region borders
    Object,
}

/// Settings for one painterly run
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// resolution = 2048
/// stroke_width = [4.0, 10.0]
/// normal_angle_threshold = 25.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PainterlyConfig {
    /// Square output resolution in pixels
    pub resolution: u32,
    /// Min and max stroke width in pixels
    pub stroke_width: [f32; 2],
    /// Min and max stroke length in pixels
    pub stroke_length: [f32; 2],
    /// Maximum angle between adjacent face normals (degrees) for them to
    /// share a region
    pub normal_angle_threshold: f32,
    /// Per-channel color jitter for coverage strokes; accents use twice this
    pub color_variation: f32,
    /// Blend opacity of coverage strokes
    pub coverage_opacity: f32,
    /// Blend opacity of accent strokes
    pub accent_opacity: f32,
    /// Ownership used to mask strokes
    pub mask: MaskMode,
    /// Regions with fewer pixels than this receive no strokes
    pub min_region_pixels: usize,
    /// One accent stroke is placed per this many region pixels
    pub accent_divisor: usize,
    /// RNG seed; a random seed is drawn when unset
    pub seed: Option<u64>,
}

impl Default for PainterlyConfig {
    fn default() -> Self {
        Self {
            resolution: 1024,
            stroke_width: [8.0, 15.0],
            stroke_length: [20.0, 40.0],
            normal_angle_threshold: DEFAULT_ANGLE_THRESHOLD,
            color_variation: 0.05,
            coverage_opacity: 0.8,
            accent_opacity: 0.7,
            mask: MaskMode::Region,
            min_region_pixels: 10,
            accent_divisor: 800,
            seed: None,
        }
    }
}

impl PainterlyConfig {
    /// Repair out-of-range values and reject unusable ones.
    ///
    /// - a range whose min exceeds its max has its max raised to the min
    /// - stroke sizes are at least one pixel
    /// - an angle threshold outside [0, 180] falls back to 10 degrees
    /// - opacities and color variation clamp to [0, 1]
    pub fn normalized(mut self) -> Result<Self> {
        if self.resolution == 0 {
            return Err(PainterlyError::InvalidResolution(self.resolution));
        }

        self.stroke_width = normalize_range(self.stroke_width);
        self.stroke_length = normalize_range(self.stroke_length);

        let angle = self.normal_angle_threshold;
        if !(0.0..=180.0).contains(&angle) {
            tracing::warn!(
                threshold = angle,
                "Normal angle threshold out of range, using {} degrees",
                DEFAULT_ANGLE_THRESHOLD
            );
            self.normal_angle_threshold = DEFAULT_ANGLE_THRESHOLD;
        }

        self.color_variation = clamp_unit(self.color_variation);
        self.coverage_opacity = clamp_unit(self.coverage_opacity);
        self.accent_opacity = clamp_unit(self.accent_opacity);
        self.accent_divisor = self.accent_divisor.max(1);

        Ok(self)
    }

    /// Mean of the stroke width range
    pub fn average_width(&self) -> f32 {
        (self.stroke_width[0] + self.stroke_width[1]) / 2.0
    }

    /// Mean of the stroke length range
    pub fn average_length(&self) -> f32 {
        (self.stroke_length[0] + self.stroke_length[1]) / 2.0
    }
}

fn normalize_range([min, max]: [f32; 2]) -> [f32; 2] {
    let min = if min.is_finite() { min.max(1.0) } else { 1.0 };
    let max = if max.is_finite() { max.max(min) } else { min };
    [min, max]
}

// NaN clamps to 0
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

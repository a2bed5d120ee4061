//! painterly.toml loading and command-line overrides

use anyhow::{Context, Result};
use clap::Args;
use painterly::{MaskMode, PainterlyConfig};
use std::path::Path;

/// Settings file wrapper around [`PainterlyConfig`]
pub struct Settings;

impl Settings {
    /// Load settings from file
    pub fn load(path: &Path) -> Result<PainterlyConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse settings from string
    pub fn parse(content: &str) -> Result<PainterlyConfig> {
        toml::from_str(content).context("Failed to parse painterly.toml")
    }

    /// Load `path` if given or if the default file exists, else use defaults
    pub fn resolve(path: Option<&Path>, default_path: &Path) -> Result<PainterlyConfig> {
        match path {
            Some(path) => Self::load(path),
            None if default_path.exists() => Self::load(default_path),
            None => Ok(PainterlyConfig::default()),
        }
    }

    pub fn default_toml() -> Result<String> {
        toml::to_string(&PainterlyConfig::default()).context("Failed to serialize default settings")
    }
}

/// Command-line overrides, applied on top of the settings file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Output resolution in pixels
    #[arg(short, long)]
    pub resolution: Option<u32>,

    /// Minimum stroke width in pixels
    #[arg(long)]
    pub min_width: Option<f32>,

    /// Maximum stroke width in pixels
    #[arg(long)]
    pub max_width: Option<f32>,

    /// Minimum stroke length in pixels
    #[arg(long)]
    pub min_length: Option<f32>,

    /// Maximum stroke length in pixels
    #[arg(long)]
    pub max_length: Option<f32>,

    /// Normal angle threshold in degrees
    #[arg(short = 't', long)]
    pub threshold: Option<f32>,

    /// Per-channel color jitter
    #[arg(long)]
    pub color_variation: Option<f32>,

    /// Mask strokes by object instead of by region
    #[arg(long)]
    pub object_mask: bool,

    /// RNG seed
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: PainterlyConfig) -> PainterlyConfig {
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(min) = self.min_width {
            config.stroke_width[0] = min;
        }
        if let Some(max) = self.max_width {
            config.stroke_width[1] = max;
        }
        if let Some(min) = self.min_length {
            config.stroke_length[0] = min;
        }
        if let Some(max) = self.max_length {
            config.stroke_length[1] = max;
        }
        if let Some(threshold) = self.threshold {
            config.normal_angle_threshold = threshold;
        }
        if let Some(variation) = self.color_variation {
            config.color_variation = variation;
        }
        if self.object_mask {
            config.mask = MaskMode::Object;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_settings() {
        let config = Settings::parse(
            r#"
            resolution = 512
            stroke_width = [4.0, 6.0]
            mask = "object"
            "#,
        )
        .unwrap();

        assert_eq!(config.resolution, 512);
        assert_eq!(config.stroke_width, [4.0, 6.0]);
        assert_eq!(config.mask, MaskMode::Object);
        assert_eq!(config.stroke_length, [20.0, 40.0]);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_parse_rejects_unknown_mask() {
        assert!(Settings::parse(r#"mask = "island""#).is_err());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let content = Settings::default_toml().unwrap();
        assert_eq!(Settings::parse(&content).unwrap(), PainterlyConfig::default());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            resolution: Some(256),
            max_width: Some(20.0),
            threshold: Some(30.0),
            object_mask: true,
            seed: Some(3),
            ..Default::default()
        };
        let config = overrides.apply(PainterlyConfig::default());

        assert_eq!(config.resolution, 256);
        assert_eq!(config.stroke_width, [8.0, 20.0]);
        assert_eq!(config.normal_angle_threshold, 30.0);
        assert_eq!(config.mask, MaskMode::Object);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("painterly.toml");
        assert_eq!(
            Settings::resolve(None, &missing).unwrap(),
            PainterlyConfig::default()
        );

        std::fs::write(&missing, "resolution = 128\n").unwrap();
        assert_eq!(Settings::resolve(None, &missing).unwrap().resolution, 128);

        let explicit = dir.path().join("other.toml");
        assert!(Settings::resolve(Some(&explicit), &missing).is_err());
    }
}

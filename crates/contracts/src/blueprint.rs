//! FilterBlueprint - Config Loader output
//!
//! Describes the complete pipeline configuration: scheduler pacing, the
//! ordered filter chain, and metrics export.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilterBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Scheduler pacing and port sizing
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Ordered filter chain (upstream first)
    #[validate(nested)]
    pub filters: Vec<FilterConfig>,

    /// Metrics export settings
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    /// Target frame rate (frames per second)
    #[serde(default = "default_frame_rate")]
    #[validate(range(min = 1, message = "frame_rate must be >= 1"))]
    pub frame_rate: u32,

    /// Capacity of the scheduler's external input/output ports
    #[serde(default = "default_port_capacity")]
    #[validate(range(min = 1, message = "port_capacity must be >= 1"))]
    pub port_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            port_capacity: default_port_capacity(),
        }
    }
}

fn default_frame_rate() -> u32 {
    60
}

fn default_port_capacity() -> usize {
    100
}

/// Metrics export settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus listener port (None = disabled)
    #[serde(default)]
    pub port: Option<u16>,
}

/// One filter in the chain
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilterConfig {
    /// Unique identifier
    #[validate(length(min = 1, message = "filter id cannot be empty"))]
    pub id: String,

    /// Filter kind and its parameters
    #[serde(flatten)]
    pub params: FilterParams,
}

/// Filter kind with its tuning parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterParams {
    /// Identity filter, forwards frames untouched
    Passthrough,

    /// Block pixelation
    Pixelate {
        /// Block size in pixels
        #[serde(default = "default_pixel_size")]
        pixel_size: u32,

        /// Block shape
        #[serde(default)]
        shape: PixelShape,
    },

    /// Ordered (Bayer) dithering
    Dither {
        /// Red channel quantization levels
        #[serde(default = "default_red_levels")]
        red_levels: u32,

        /// Green channel quantization levels
        #[serde(default = "default_green_levels")]
        green_levels: u32,

        /// Blue channel quantization levels
        #[serde(default = "default_blue_levels")]
        blue_levels: u32,

        /// Dithering spread
        #[serde(default = "default_spread")]
        spread: u32,

        /// Bayer matrix level (0 = 2x2, 1 = 4x4, 2 = 8x8)
        #[serde(default = "default_bayer_level")]
        bayer_level: u32,
    },

    /// Rec. 709 grayscale conversion
    Grayscale,

    /// Banner overlay
    Banner {
        /// Path to the banner BMP
        path: PathBuf,

        /// Overlay X offset in pixels
        #[serde(default = "default_overlay_x")]
        offset_x: u32,

        /// Overlay Y offset in pixels
        #[serde(default = "default_overlay_y")]
        offset_y: u32,
    },
}

/// Pixelation block shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelShape {
    #[default]
    Square,
    Triangle,
}

fn default_pixel_size() -> u32 {
    4
}

fn default_red_levels() -> u32 {
    3
}

fn default_green_levels() -> u32 {
    6
}

fn default_blue_levels() -> u32 {
    3
}

fn default_spread() -> u32 {
    3
}

fn default_bayer_level() -> u32 {
    2
}

fn default_overlay_x() -> u32 {
    64
}

fn default_overlay_y() -> u32 {
    32
}

impl FilterParams {
    /// Kind name as it appears in config files
    pub fn kind_name(&self) -> &'static str {
        match self {
            FilterParams::Passthrough => "passthrough",
            FilterParams::Pixelate { .. } => "pixelate",
            FilterParams::Dither { .. } => "dither",
            FilterParams::Grayscale => "grayscale",
            FilterParams::Banner { .. } => "banner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_blueprint() -> FilterBlueprint {
        FilterBlueprint {
            version: ConfigVersion::V1,
            scheduler: SchedulerConfig::default(),
            filters: vec![
                FilterConfig {
                    id: "pixelate".into(),
                    params: FilterParams::Pixelate {
                        pixel_size: 4,
                        shape: PixelShape::Square,
                    },
                },
                FilterConfig {
                    id: "grayscale".into(),
                    params: FilterParams::Grayscale,
                },
            ],
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.port_capacity, 100);
    }

    #[test]
    fn test_kind_names() {
        let bp = sample_blueprint();
        assert_eq!(bp.filters[0].params.kind_name(), "pixelate");
        assert_eq!(bp.filters[1].params.kind_name(), "grayscale");
    }

    #[test]
    fn test_toml_round_trip() {
        let bp = sample_blueprint();
        let serialized = toml::to_string(&bp).unwrap();
        let parsed: FilterBlueprint = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.filters.len(), bp.filters.len());
        assert_eq!(parsed.filters[0].id, "pixelate");
    }

    #[test]
    fn test_dither_defaults_from_toml() {
        let content = r#"
[[filters]]
id = "dither"
kind = "dither"
"#;
        let bp: FilterBlueprint = toml::from_str(content).unwrap();
        match &bp.filters[0].params {
            FilterParams::Dither {
                red_levels,
                green_levels,
                blue_levels,
                spread,
                bayer_level,
            } => {
                assert_eq!(*red_levels, 3);
                assert_eq!(*green_levels, 6);
                assert_eq!(*blue_levels, 3);
                assert_eq!(*spread, 3);
                assert_eq!(*bayer_level, 2);
            }
            other => panic!("expected dither, got {other:?}"),
        }
    }
}

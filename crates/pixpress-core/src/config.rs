//! Per-image processing configuration.
//!
//! An [`ImageConfig`] is an immutable value handed to the pipeline for each
//! image. Values outside the accepted ranges are rejected, never clamped, so
//! the palette-size and dimension formulas downstream stay well-defined.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted quality value.
pub const MIN_QUALITY: f32 = 0.1;
/// Highest accepted quality value.
pub const MAX_QUALITY: f32 = 1.0;
/// Lowest accepted scale factor.
pub const MIN_SCALE: f32 = 0.1;
/// Highest accepted scale factor.
pub const MAX_SCALE: f32 = 2.0;

/// Errors produced when validating an [`ImageConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Quality is NaN or outside 0.1..=1.0.
    #[error("Quality {0} is out of range (0.1 to 1.0)")]
    QualityOutOfRange(f32),

    /// Scale is NaN or outside 0.1..=2.0.
    #[error("Scale {0} is out of range (0.1 to 2.0)")]
    ScaleOutOfRange(f32),

    /// The output format string is not one of the known formats.
    #[error("Unknown output format: {0}")]
    UnknownFormat(String),
}

/// Requested output format.
///
/// Serialized with the same strings the web UI uses for its format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Keep JPEG or PNG sources as they are; anything else becomes PNG.
    #[serde(rename = "original")]
    Original,
    /// Lossy full-color JPEG, composited onto white.
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    /// Lossless full-color RGBA PNG.
    #[serde(rename = "image/png")]
    Png,
    /// Palette-quantized PNG with per-entry alpha.
    #[serde(rename = "image/png-lossy")]
    PngLossy,
}

impl OutputFormat {
    /// The wire name of this format.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Original => "original",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::PngLossy => "image/png-lossy",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "original" => Ok(OutputFormat::Original),
            "image/jpeg" | "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "image/png" | "png" => Ok(OutputFormat::Png),
            "image/png-lossy" | "png-lossy" => Ok(OutputFormat::PngLossy),
            other => Err(ConfigError::UnknownFormat(other.to_string())),
        }
    }
}

/// Settings for transforming a single image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Compression quality (0.1 to 1.0). Drives JPEG quality and palette size.
    pub quality: f32,
    /// Dimension scale factor (0.1 to 2.0).
    pub scale: f32,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            quality: 0.8,
            scale: 1.0,
            format: OutputFormat::Jpeg,
        }
    }
}

impl ImageConfig {
    /// Create a validated configuration.
    pub fn new(quality: f32, scale: f32, format: OutputFormat) -> Result<Self, ConfigError> {
        let config = Self {
            quality,
            scale,
            format,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that quality and scale are inside their accepted ranges.
    ///
    /// NaN fails both range checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&self.quality) {
            return Err(ConfigError::QualityOutOfRange(self.quality));
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            return Err(ConfigError::ScaleOutOfRange(self.scale));
        }
        Ok(())
    }

    /// Return a copy with a different output format.
    pub fn with_format(self, format: OutputFormat) -> Self {
        Self { format, ..self }
    }
}

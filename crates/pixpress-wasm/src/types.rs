//! WASM-compatible wrapper types.
//!
//! This module provides JavaScript-friendly types that wrap the core pixpress
//! types, handling the conversion between Rust and JavaScript representations.

use pixpress_core::{ConfigError, ImageConfig, OutputFormat, ProcessedImage, SourceInfo};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// JavaScript-compatible processing configuration.
///
/// Passed from TypeScript as a plain object via serde_wasm_bindgen. Missing
/// fields fall back to the application defaults, so `{ scale: 0.5 }` is a
/// valid config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsImageConfig {
    #[serde(default = "default_quality")]
    pub quality: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_quality() -> f32 {
    ImageConfig::default().quality
}

fn default_scale() -> f32 {
    ImageConfig::default().scale
}

fn default_format() -> String {
    ImageConfig::default().format.to_string()
}

impl Default for JsImageConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            scale: default_scale(),
            format: default_format(),
        }
    }
}

impl TryFrom<JsImageConfig> for ImageConfig {
    type Error = ConfigError;

    fn try_from(js: JsImageConfig) -> Result<Self, Self::Error> {
        let format: OutputFormat = js.format.parse()?;
        ImageConfig::new(js.quality, js.scale, format)
    }
}

/// A processed image handed to JavaScript.
///
/// The encoded bytes live in WASM memory until the object is freed.
/// `bytes()` copies them into a `Uint8Array`.
#[wasm_bindgen]
#[derive(Debug)]
pub struct JsProcessedImage {
    width: u32,
    height: u32,
    mime: &'static str,
    extension: &'static str,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl JsProcessedImage {
    /// Output width in pixels
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the encoded file in bytes
    #[wasm_bindgen(getter)]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// MIME type of the encoded file (`image/jpeg` or `image/png`)
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.mime.to_string()
    }

    /// File extension for downloads, without the dot
    #[wasm_bindgen(getter)]
    pub fn extension(&self) -> String {
        self.extension.to_string()
    }

    /// Returns the encoded file as a Uint8Array.
    ///
    /// Note: This creates a copy of the bytes.
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

impl JsProcessedImage {
    pub(crate) fn from_processed(image: ProcessedImage) -> Self {
        Self {
            width: image.width,
            height: image.height,
            mime: image.mime.as_str(),
            extension: image.mime.extension(),
            bytes: image.bytes,
        }
    }
}

/// Facts about a source image, for the card badges.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy)]
pub struct JsSourceInfo {
    info: SourceInfo,
}

#[wasm_bindgen]
impl JsSourceInfo {
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.info.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Canonical MIME type of the source, or `undefined` if unrecognized
    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> Option<String> {
        self.info.mime.as_str().map(str::to_string)
    }

    /// Whether a sampled pixel has alpha below 255
    #[wasm_bindgen(getter)]
    pub fn has_transparency(&self) -> bool {
        self.info.has_transparency
    }

    /// Whether converting to JPEG would lose no visible transparency
    #[wasm_bindgen(getter)]
    pub fn suggests_jpeg(&self) -> bool {
        self.info.suggests_jpeg()
    }
}

impl From<SourceInfo> for JsSourceInfo {
    fn from(info: SourceInfo) -> Self {
        Self { info }
    }
}

//! Image processing WASM bindings.
//!
//! # Functions
//!
//! - [`process_image`] - Decode, resample and re-encode one image
//! - [`inspect_image`] - Read dimensions and the transparency hint
//! - [`has_transparency`] - Sampled alpha check over canvas `ImageData`
//! - [`palette_size_for_quality`] - Palette budget for the lossy PNG path
//!
//! # Example
//!
//! ```typescript
//! import { process_image, inspect_image } from '@pixpress/wasm';
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const info = inspect_image(bytes, file.type);
//! const out = process_image(bytes, file.type, { quality: 0.8, scale: 0.5, format: 'image/jpeg' });
//! const blob = new Blob([out.bytes()], { type: out.mime });
//! ```

use pixpress_core::transparency::has_transparency_rgba;
use pixpress_core::{pipeline, quantize, ImageConfig, ProcessError, SourceMime};
use wasm_bindgen::prelude::*;

use crate::types::{JsImageConfig, JsProcessedImage, JsSourceInfo};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse a JS config object; `undefined` or `null` means the defaults.
fn parse_config(value: JsValue) -> Result<ImageConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(ImageConfig::default());
    }
    let js: JsImageConfig = serde_wasm_bindgen::from_value(value).map_err(to_js_error)?;
    ImageConfig::try_from(js).map_err(to_js_error)
}

fn process(
    bytes: &[u8],
    mime: &str,
    config: &ImageConfig,
) -> Result<JsProcessedImage, ProcessError> {
    pipeline::process_image(bytes, SourceMime::parse(mime), config)
        .map(JsProcessedImage::from_processed)
}

fn expected_pixel_len(width: u32, height: u32) -> Option<u64> {
    u64::from(width)
        .checked_mul(u64::from(height))
        .and_then(|n| n.checked_mul(4))
}

fn pixel_len_matches(pixels: &[u8], width: u32, height: u32) -> bool {
    expected_pixel_len(width, height) == Some(pixels.len() as u64)
}

/// Transform one image.
///
/// # Arguments
///
/// * `bytes` - The source file bytes as a `Uint8Array`
/// * `mime` - The source file's MIME type (`File.type`)
/// * `config` - `{ quality, scale, format }`; missing fields use the defaults
///
/// # Errors
///
/// Returns an error string if the config is invalid or any stage fails.
#[wasm_bindgen]
pub fn process_image(
    bytes: &[u8],
    mime: &str,
    config: JsValue,
) -> Result<JsProcessedImage, JsValue> {
    let config = parse_config(config)?;
    process(bytes, mime, &config).map_err(to_js_error)
}

/// Decode a source image and report its dimensions and transparency hint.
#[wasm_bindgen]
pub fn inspect_image(bytes: &[u8], mime: &str) -> Result<JsSourceInfo, JsValue> {
    pipeline::inspect_image(bytes, SourceMime::parse(mime))
        .map(JsSourceInfo::from)
        .map_err(to_js_error)
}

/// Sampled transparency check over RGBA pixels, e.g. from `ImageData.data`.
///
/// # Errors
///
/// Returns an error if `pixels.length != width * height * 4`.
#[wasm_bindgen]
pub fn has_transparency(pixels: &[u8], width: u32, height: u32) -> Result<bool, JsValue> {
    if !pixel_len_matches(pixels, width, height) {
        return Err(JsValue::from_str(&format!(
            "Invalid pixel data: expected {} bytes for {width}x{height}, got {}",
            expected_pixel_len(width, height).unwrap_or(u64::MAX),
            pixels.len()
        )));
    }
    Ok(has_transparency_rgba(pixels, width, height))
}

/// Number of palette colors the lossy PNG path uses at `quality`.
#[wasm_bindgen]
pub fn palette_size_for_quality(quality: f32) -> u32 {
    quantize::palette_size_for_quality(quality) as u32
}

/// 1x1 RGBA PNG, pixel (255, 0, 0, 128)
#[cfg(test)]
fn tiny_png() -> Vec<u8> {
    use image::ImageEncoder;

    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(&[255, 0, 0, 128], 1, 1, image::ExtendedColorType::Rgba8)
        .unwrap();
    out
}

//! Scale-factor resampling of RGBA rasters.
//!
//! Uses the `image` crate's triangle (bilinear) filter on premultiplied RGBA,
//! so transparent pixels contribute no color to their neighbours. All
//! functions return new `RasterImage` instances without modifying the input.

use image::imageops::FilterType;
use image::Rgba32FImage;

use super::{DecodeError, RasterImage};

/// Compute the output dimensions for a scale factor.
///
/// Each side is `max(1, round(side * scale))`, so the result is never 0x0.
pub fn target_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    (scale_side(width, scale), scale_side(height, scale))
}

fn scale_side(side: u32, scale: f32) -> u32 {
    let scaled = (f64::from(side) * f64::from(scale)).round();
    // `as` saturates, so NaN becomes 0 and is lifted to 1 here.
    (scaled as u32).max(1)
}

/// Resample an image by a scale factor.
///
/// When the computed dimensions equal the source dimensions the pixels are
/// copied unchanged.
///
/// # Errors
///
/// Returns `DecodeError::PixelDataMismatch` if the source buffer does not
/// match its dimensions.
pub fn resample(image: &RasterImage, scale: f32) -> Result<RasterImage, DecodeError> {
    let (width, height) = target_dimensions(image.width, image.height, scale);
    resize(image, width, height)
}

/// Resize an image to exact dimensions.
///
/// # Errors
///
/// Returns `DecodeError::InvalidDimensions` for a zero target side and
/// `DecodeError::PixelDataMismatch` if the source cannot be converted.
pub fn resize(image: &RasterImage, width: u32, height: u32) -> Result<RasterImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, just clone
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let premultiplied = premultiply(image).ok_or_else(|| DecodeError::PixelDataMismatch {
        expected: super::expected_len(image.width, image.height),
        actual: image.pixels.len(),
    })?;

    let resized = image::imageops::resize(&premultiplied, width, height, FilterType::Triangle);

    log::debug!(
        "resampled {}x{} -> {}x{}",
        image.width,
        image.height,
        width,
        height
    );
    Ok(RasterImage::new(width, height, unpremultiply(&resized)))
}

/// Normalized premultiplied copy of `image`, or `None` on a length mismatch.
fn premultiply(image: &RasterImage) -> Option<Rgba32FImage> {
    if image.pixels.len() != super::expected_len(image.width, image.height) {
        return None;
    }
    let data: Vec<f32> = image
        .pixels
        .chunks_exact(4)
        .flat_map(|px| {
            let alpha = f32::from(px[3]) / 255.0;
            let channel = |v: u8| f32::from(v) / 255.0 * alpha;
            [channel(px[0]), channel(px[1]), channel(px[2]), alpha]
        })
        .collect();
    Rgba32FImage::from_raw(image.width, image.height, data)
}

/// Back to straight 8-bit RGBA. Fully transparent pixels become `(0,0,0,0)`.
fn unpremultiply(image: &Rgba32FImage) -> Vec<u8> {
    let to_u8 = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    image
        .pixels()
        .flat_map(|px| {
            let [r, g, b, a] = px.0;
            let alpha = to_u8(a);
            if alpha == 0 {
                [0, 0, 0, 0]
            } else {
                [to_u8(r / a), to_u8(g / a), to_u8(b / a), alpha]
            }
        })
        .collect()
}


// ============================================================================
// Property-Based Tests
// ============================================================================

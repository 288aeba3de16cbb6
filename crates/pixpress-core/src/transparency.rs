//! Sampled transparency detection.
//!
//! The result is a UI hint ("has transparent pixels" / "could be a JPEG").
//! Large images are sampled with a stride, so an isolated transparent pixel
//! can be missed; the scan never reports transparency that is not in the
//! sampled set.

use crate::decode::RasterImage;

/// Choose the sampling stride for an image with `pixel_count` pixels.
///
/// | pixels        | step |
/// |---------------|------|
/// | > 2,000,000   | 16   |
/// | > 500,000     | 8    |
/// | > 100,000     | 4    |
/// | otherwise     | 1    |
pub fn sampling_step(pixel_count: u64) -> usize {
    match pixel_count {
        n if n > 2_000_000 => 16,
        n if n > 500_000 => 8,
        n if n > 100_000 => 4,
        _ => 1,
    }
}

/// Check whether a raster has any sampled pixel with alpha below 255.
pub fn has_transparency(image: &RasterImage) -> bool {
    has_transparency_rgba(&image.pixels, image.width, image.height)
}

/// Check raw RGBA pixel data (4 bytes per pixel, row-major) for transparency.
///
/// Pixels `0, step, 2*step, ...` are inspected, where `step` comes from
/// [`sampling_step`] for `width * height`. A trailing partial pixel is ignored.
pub fn has_transparency_rgba(pixels: &[u8], width: u32, height: u32) -> bool {
    let step = sampling_step(u64::from(width) * u64::from(height));

    debug_assert!(
        pixels.len() == (width as usize) * (height as usize) * 4,
        "Pixel data size mismatch. Expected {}, got {}",
        (width as usize) * (height as usize) * 4,
        pixels.len()
    );

    pixels
        .chunks_exact(4)
        .step_by(step)
        .any(|px| px[3] < u8::MAX)
}

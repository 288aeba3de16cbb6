//! Palette quantization for the lossy indexed-PNG path.
//!
//! The palette budget is a step function of the quality setting. Colors are
//! treated as 4-D RGBA points, so translucent and opaque versions of the same
//! color get separate palette entries when the budget allows.
//!
//! # Examples
//!
//! ```ignore
//! use pixpress_core::quantize::{quantize, palette_size_for_quality};
//!
//! assert_eq!(palette_size_for_quality(0.5), 32);
//! let indexed = quantize(&raster, 0.5).unwrap();
//! assert!(indexed.palette.len() <= 32);
//! ```

mod median_cut;

use std::collections::HashMap;

use thiserror::Error;

use crate::decode::{expected_len, RasterImage};
use median_cut::{median_cut, nearest_index, ColorCount};

/// Palette sizes selectable through the quality setting, smallest first.
pub const PALETTE_SIZES: [usize; 6] = [8, 16, 32, 64, 128, 256];

/// Errors that can occur during quantization.
#[derive(Debug, Error)]
pub enum QuantizationError {
    /// The raster has no pixels.
    #[error("Cannot quantize an image with no pixels")]
    EmptyImage,

    /// Pixel data length doesn't match the raster dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    PixelDataMismatch { expected: usize, actual: usize },

    /// Palette budget outside 1..=256.
    #[error("Invalid palette size {0}: must be between 1 and 256")]
    InvalidPaletteSize(usize),
}

/// Map a quality value to a palette size.
///
/// | quality | colors |
/// |---------|--------|
/// | ≤ 0.20  | 8      |
/// | ≤ 0.40  | 16     |
/// | ≤ 0.60  | 32     |
/// | ≤ 0.80  | 64     |
/// | ≤ 0.95  | 128    |
/// | > 0.95  | 256    |
pub fn palette_size_for_quality(quality: f32) -> usize {
    match quality {
        q if q <= 0.2 => 8,
        q if q <= 0.4 => 16,
        q if q <= 0.6 => 32,
        q if q <= 0.8 => 64,
        q if q <= 0.95 => 128,
        _ => 256,
    }
}

/// A palette image: RGBA palette entries plus one index per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Palette entries in straight RGBA. At most 256.
    pub palette: Vec<[u8; 4]>,
    /// One palette index per pixel, row-major.
    pub indices: Vec<u8>,
}

impl IndexedImage {
    /// True if any palette entry is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.palette.iter().any(|c| c[3] < u8::MAX)
    }

    /// Expand back to an RGBA raster.
    pub fn to_raster(&self) -> RasterImage {
        let pixels = self
            .indices
            .iter()
            .flat_map(|&i| self.palette[usize::from(i)])
            .collect();
        RasterImage::new(self.width, self.height, pixels)
    }
}

/// Quantize a raster with a palette budget derived from `quality`.
///
/// # Errors
///
/// Returns `QuantizationError::EmptyImage` for a zero-pixel raster.
pub fn quantize(image: &RasterImage, quality: f32) -> Result<IndexedImage, QuantizationError> {
    quantize_to(image, palette_size_for_quality(quality))
}

/// Quantize a raster to at most `max_colors` palette entries.
///
/// Images with no more distinct colors than the budget are mapped exactly.
/// The output is deterministic for identical input.
pub fn quantize_to(
    image: &RasterImage,
    max_colors: usize,
) -> Result<IndexedImage, QuantizationError> {
    if !(1..=256).contains(&max_colors) {
        return Err(QuantizationError::InvalidPaletteSize(max_colors));
    }
    if image.width == 0 || image.height == 0 || image.pixels.is_empty() {
        return Err(QuantizationError::EmptyImage);
    }
    let expected = expected_len(image.width, image.height);
    if image.pixels.len() != expected {
        return Err(QuantizationError::PixelDataMismatch {
            expected,
            actual: image.pixels.len(),
        });
    }

    let histogram = build_histogram(&image.pixels);

    let (palette, lookup) = if histogram.len() <= max_colors {
        let palette: Vec<[u8; 4]> = histogram.iter().map(|e| e.rgba).collect();
        let lookup = palette
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, i as u8))
            .collect::<HashMap<_, _>>();
        (palette, lookup)
    } else {
        let centroids = median_cut(&histogram, max_colors);
        let palette = round_palette(&centroids);
        let palette_f: Vec<[f32; 4]> = palette.iter().map(|c| c.map(f32::from)).collect();
        let lookup = histogram
            .iter()
            .map(|e| (e.rgba, nearest_index(&palette_f, e.rgba.map(f32::from)) as u8))
            .collect::<HashMap<_, _>>();
        (palette, lookup)
    };

    let indices = image
        .pixels
        .chunks_exact(4)
        .map(|px| lookup[&histogram_key(px)])
        .collect();

    log::debug!(
        "quantized {} distinct colors to {} palette entries (budget {})",
        histogram.len(),
        palette.len(),
        max_colors
    );

    Ok(IndexedImage {
        width: image.width,
        height: image.height,
        palette,
        indices,
    })
}

/// Fully transparent pixels share one key; their color channels are invisible.
#[inline]
fn histogram_key(px: &[u8]) -> [u8; 4] {
    if px[3] == 0 {
        [0, 0, 0, 0]
    } else {
        [px[0], px[1], px[2], px[3]]
    }
}

/// Count distinct colors, sorted by color so later stages see a stable order.
fn build_histogram(pixels: &[u8]) -> Vec<ColorCount> {
    let mut counts: HashMap<[u8; 4], u32> = HashMap::new();
    for px in pixels.chunks_exact(4) {
        *counts.entry(histogram_key(px)).or_insert(0) += 1;
    }

    let mut histogram: Vec<ColorCount> = counts
        .into_iter()
        .map(|(rgba, count)| ColorCount { rgba, count })
        .collect();
    histogram.sort_unstable_by_key(|e| e.rgba);
    histogram
}

/// Round centroids to 8-bit and drop duplicates created by rounding.
fn round_palette(centroids: &[[f32; 4]]) -> Vec<[u8; 4]> {
    let mut palette: Vec<[u8; 4]> = Vec::with_capacity(centroids.len());
    for centroid in centroids {
        let color = centroid.map(|v| v.round().clamp(0.0, 255.0) as u8);
        if !palette.contains(&color) {
            palette.push(color);
        }
    }
    palette
}

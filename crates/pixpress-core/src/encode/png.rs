//! PNG encoding: lossless RGBA and indexed palette output.

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError};
use crate::decode::RasterImage;
use crate::quantize::IndexedImage;

/// Encode an RGBA raster as a lossless 8-bit RGBA PNG.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, EncodeError> {
    check_buffer(&image.pixels, image.width, image.height, 4)?;

    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Default, FilterType::Adaptive);
    encoder
        .write_image(
            &image.pixels,
            image.width,
            image.height,
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(out)
}

/// Encode a palette image as an 8-bit indexed PNG.
///
/// The PLTE chunk holds the RGB part of each entry. A tRNS chunk is written
/// only when some entry is not fully opaque.
pub fn encode_indexed_png(image: &IndexedImage) -> Result<Vec<u8>, EncodeError> {
    check_buffer(&image.indices, image.width, image.height, 1)?;
    if image.palette.is_empty() || image.palette.len() > 256 {
        return Err(EncodeError::EncodingFailed(format!(
            "palette must hold 1 to 256 entries, got {}",
            image.palette.len()
        )));
    }
    if let Some(&bad) = image
        .indices
        .iter()
        .find(|&&i| usize::from(i) >= image.palette.len())
    {
        return Err(EncodeError::EncodingFailed(format!(
            "palette index {bad} out of range for {} entries",
            image.palette.len()
        )));
    }

    let plte: Vec<u8> = image.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width, image.height);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(plte);
        if image.has_alpha() {
            let trns: Vec<u8> = image.palette.iter().map(|c| c[3]).collect();
            encoder.set_trns(trns);
        }

        let mut writer = encoder.write_header().map_err(png_error)?;
        writer
            .write_image_data(&image.indices)
            .map_err(png_error)?;
        writer.finish().map_err(png_error)?;
    }

    Ok(out)
}

fn png_error(e: png::EncodingError) -> EncodeError {
    EncodeError::EncodingFailed(e.to_string())
}

//! JPEG encoding.
//!
//! JPEG has no alpha channel, so RGBA input is composited onto opaque white
//! before encoding. Quality is accepted either on the codec's 1-100 scale or
//! as the 0.1-1.0 configuration value.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};

use super::{check_buffer, EncodeError};
use crate::decode::RasterImage;

/// Map a 0.1-1.0 quality value to the codec's 1-100 scale.
///
/// `round(quality * 100)` clamped to 1..=100; NaN maps to 1.
pub fn jpeg_quality(quality: f32) -> u8 {
    let scaled = (quality * 100.0).round();
    (scaled as i32).clamp(1, 100) as u8
}

/// Composite straight RGBA over opaque white, producing packed RGB.
///
/// Each channel becomes `round((c * a + 255 * (255 - a)) / 255)`.
pub fn composite_on_white(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u32::from(px[3]);
        for &c in &px[..3] {
            let blended = (u32::from(c) * a + 255 * (255 - a) + 127) / 255;
            rgb.push(blended as u8);
        }
    }
    rgb
}

/// Encode an RGBA raster to JPEG at a 0.1-1.0 quality.
pub fn encode_jpeg_rgba(image: &RasterImage, quality: f32) -> Result<Vec<u8>, EncodeError> {
    check_buffer(&image.pixels, image.width, image.height, 4)?;
    let rgb = composite_on_white(&image.pixels);
    encode_jpeg(&rgb, image.width, image.height, jpeg_quality(quality))
}

/// Encode RGB pixel data to JPEG bytes.
///
/// # Arguments
///
/// * `pixels` - RGB pixel data (3 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - JPEG quality (1-100, where 100 is highest quality)
///
/// # Returns
///
/// JPEG-encoded bytes on success, or an error if encoding fails.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    check_buffer(pixels, width, height, 3)?;

    let quality = quality.clamp(1, 100);

    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.8), 80);
        assert_eq!(jpeg_quality(0.1), 10);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.555), 56);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(3.0), 100);
        assert_eq!(jpeg_quality(f32::NAN), 1);
    }

    #[test]
    fn test_composite_opaque_is_unchanged() {
        assert_eq!(composite_on_white(&[10, 20, 30, 255]), vec![10, 20, 30]);
    }

    #[test]
    fn test_composite_transparent_is_white() {
        assert_eq!(composite_on_white(&[10, 20, 30, 0]), vec![255, 255, 255]);
    }

    #[test]
    fn test_composite_half_alpha() {
        // (0 * 128 + 255 * 127 + 127) / 255 = 127
        assert_eq!(composite_on_white(&[0, 0, 0, 128]), vec![127, 127, 127]);
        assert_eq!(composite_on_white(&[255, 255, 255, 128]), vec![255, 255, 255]);
    }

    #[test]
    fn test_encode_jpeg_basic() {
        let pixels = vec![128u8; 100 * 100 * 3];
        let jpeg_bytes = encode_jpeg(&pixels, 100, 100, 90).unwrap();

        // SOI and EOI markers
        assert_eq!(&jpeg_bytes[0..2], &[0xFF, 0xD8]);
        let len = jpeg_bytes.len();
        assert_eq!(&jpeg_bytes[len - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_jpeg_quality_clamping() {
        let pixels = vec![128u8; 10 * 10 * 3];
        assert!(encode_jpeg(&pixels, 10, 10, 0).is_ok());
        assert!(encode_jpeg(&pixels, 10, 10, 255).is_ok());
    }

    #[test]
    fn test_encode_jpeg_invalid_pixel_data() {
        let pixels = vec![128u8; 99 * 100 * 3];
        assert!(matches!(
            encode_jpeg(&pixels, 100, 100, 90),
            Err(EncodeError::InvalidPixelData { .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_zero_dimensions() {
        assert!(matches!(
            encode_jpeg(&[], 0, 100, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            encode_jpeg(&[], 100, 0, 90),
            Err(EncodeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_rgba_transparent_decodes_white() {
        let img = RasterImage::filled(16, 16, [0, 0, 0, 0]);
        let bytes = encode_jpeg_rgba(&img, 1.0).unwrap();

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c >= 250)));
    }

    #[test]
    fn test_encode_jpeg_rgba_rejects_rgb_buffer() {
        let img = RasterImage {
            width: 4,
            height: 4,
            pixels: vec![0u8; 4 * 4 * 3],
        };
        assert!(matches!(
            encode_jpeg_rgba(&img, 0.8),
            Err(EncodeError::InvalidPixelData { .. })
        ));
    }

    #[test]
    fn test_encode_jpeg_quality_affects_size() {
        let mut pixels = Vec::with_capacity(64 * 64 * 3);
        for y in 0..64u32 {
            for x in 0..64u32 {
                pixels.push((x * 4) as u8);
                pixels.push((y * 4) as u8);
                pixels.push(((x * y) % 256) as u8);
            }
        }
        let low = encode_jpeg(&pixels, 64, 64, 10).unwrap();
        let high = encode_jpeg(&pixels, 64, 64, 100).unwrap();
        assert!(high.len() > low.len());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

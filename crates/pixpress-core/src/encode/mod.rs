//! Encoder dispatch and format-specific encoders.
//!
//! This module provides functionality for:
//! - Encoding rasters to JPEG with alpha composited onto white
//! - Encoding rasters to lossless RGBA PNG
//! - Encoding quantized rasters to indexed PNG (PLTE + tRNS)
//! - Routing an [`ImageConfig`](crate::ImageConfig) to the right encoder
//!
//! # Examples
//!
//! ```ignore
//! use pixpress_core::encode::encode_image;
//! use pixpress_core::{ImageConfig, SourceMime};
//!
//! let encoded = encode_image(&raster, &ImageConfig::default(), SourceMime::Png).unwrap();
//! assert_eq!(encoded.mime.as_str(), "image/jpeg");
//! ```

mod dispatch;
mod jpeg;
mod png;

use thiserror::Error;

use crate::quantize::QuantizationError;

pub use self::dispatch::{
    encode_image, encode_quantized, resolve_encoder, EncodedImage, EncoderKind, OutputMime,
};
pub use self::jpeg::{composite_on_white, encode_jpeg, encode_jpeg_rgba, jpeg_quality};
pub use self::png::{encode_indexed_png, encode_png};

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec reported a failure
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The codec returned no bytes
    #[error("Encoder produced empty output")]
    EmptyOutput,

    /// Palette reduction failed on the indexed path
    #[error(transparent)]
    Quantization(#[from] QuantizationError),
}

/// Shared dimension and length checks.
pub(crate) fn check_buffer(
    pixels: &[u8],
    width: u32,
    height: u32,
    channels: usize,
) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }
    let expected = (width as usize) * (height as usize) * channels;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

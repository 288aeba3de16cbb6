//! Routing from configuration to a concrete encoder.

use std::fmt;

use super::{encode_indexed_png, encode_jpeg_rgba, encode_png, EncodeError};
use crate::config::{ImageConfig, OutputFormat};
use crate::decode::{RasterImage, SourceMime};
use crate::quantize::{quantize, IndexedImage};

/// MIME type of an encoded output. Only JPEG and PNG are ever produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputMime {
    Jpeg,
    Png,
}

impl OutputMime {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMime::Jpeg => "image/jpeg",
            OutputMime::Png => "image/png",
        }
    }

    /// File extension for download names, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputMime::Jpeg => "jpg",
            OutputMime::Png => "png",
        }
    }
}

impl fmt::Display for OutputMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The concrete encoder an image is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderKind {
    /// Opaque lossy JPEG.
    Jpeg,
    /// Lossless RGBA PNG.
    Png,
    /// Quantized palette PNG.
    IndexedPng,
}

impl EncoderKind {
    pub fn output_mime(self) -> OutputMime {
        match self {
            EncoderKind::Jpeg => OutputMime::Jpeg,
            EncoderKind::Png | EncoderKind::IndexedPng => OutputMime::Png,
        }
    }
}

/// Pick the encoder for a requested format and source type.
///
/// `Original` keeps JPEG and PNG sources in their own format and sends every
/// other source to lossless PNG.
pub fn resolve_encoder(format: OutputFormat, source: SourceMime) -> EncoderKind {
    match format {
        OutputFormat::Jpeg => EncoderKind::Jpeg,
        OutputFormat::Png => EncoderKind::Png,
        OutputFormat::PngLossy => EncoderKind::IndexedPng,
        OutputFormat::Original => match source {
            SourceMime::Jpeg => EncoderKind::Jpeg,
            SourceMime::Png
            | SourceMime::Webp
            | SourceMime::Gif
            | SourceMime::Bmp
            | SourceMime::Unknown => EncoderKind::Png,
        },
    }
}

/// Encoded bytes and the MIME type they were written as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: OutputMime,
}

/// Encode a raster according to `config`.
///
/// `config.quality` drives the JPEG quality and the palette size; it is
/// ignored by lossless PNG. The raster is consumed only by reference.
///
/// # Errors
///
/// Returns an `EncodeError` if the codec fails, quantization fails, or the
/// codec produced no bytes.
pub fn encode_image(
    image: &RasterImage,
    config: &ImageConfig,
    source: SourceMime,
) -> Result<EncodedImage, EncodeError> {
    let kind = resolve_encoder(config.format, source);

    let bytes = match kind {
        EncoderKind::Jpeg => encode_jpeg_rgba(image, config.quality)?,
        EncoderKind::Png => encode_png(image)?,
        EncoderKind::IndexedPng => {
            return encode_quantized(&quantize(image, config.quality)?);
        }
    };

    finish(kind, image.width, image.height, bytes)
}

/// Encode an already quantized image as a palette PNG.
///
/// This is the second half of the `IndexedPng` route of [`encode_image`],
/// for callers that need to act between quantizing and writing.
pub fn encode_quantized(image: &IndexedImage) -> Result<EncodedImage, EncodeError> {
    let bytes = encode_indexed_png(image)?;
    finish(EncoderKind::IndexedPng, image.width, image.height, bytes)
}

fn finish(
    kind: EncoderKind,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
) -> Result<EncodedImage, EncodeError> {
    if bytes.is_empty() {
        return Err(EncodeError::EmptyOutput);
    }

    log::debug!("encoded {width}x{height} as {kind:?} ({} bytes)", bytes.len());

    Ok(EncodedImage {
        bytes,
        mime: kind.output_mime(),
    })
}

//! Per-image pipeline: load, resample, encode.
//!
//! Each call is self-contained. The decoded raster lives only for the
//! duration of the call and the returned [`ProcessedImage`] is owned by the
//! caller; nothing is cached between calls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ImageConfig};
use crate::decode::{load_image, resample, DecodeError, SourceMime};
use crate::encode::{
    encode_image, encode_quantized, resolve_encoder, EncodeError, EncoderKind, OutputMime,
};
use crate::quantize::{quantize, QuantizationError};
use crate::transparency::has_transparency;

/// Any failure of a single pipeline run.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Quantization failed: {0}")]
    Quantization(#[from] QuantizationError),

    #[error("Encode failed: {0}")]
    Encode(EncodeError),

    #[error("Processing was cancelled")]
    Cancelled,
}

impl From<EncodeError> for ProcessError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::Quantization(q) => ProcessError::Quantization(q),
            other => ProcessError::Encode(other),
        }
    }
}

/// Result of transforming one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    /// Encoded output file.
    pub bytes: Vec<u8>,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Length of `bytes`.
    pub byte_size: usize,
    /// Format `bytes` is encoded in.
    pub mime: OutputMime,
}

/// Facts about a source image, gathered once when it is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub mime: SourceMime,
    /// Advisory; see [`crate::transparency`] for the sampling rules.
    pub has_transparency: bool,
}

impl SourceInfo {
    /// True when the source could carry alpha but no sampled pixel uses it,
    /// so converting to JPEG loses nothing visible.
    pub fn suggests_jpeg(&self) -> bool {
        self.mime.supports_alpha() && !self.has_transparency
    }
}

/// Cooperative cancellation flag shared between a caller and running work.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), ProcessError> {
        if self.is_cancelled() {
            Err(ProcessError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Decode `bytes`, resample by `config.scale` and encode per `config`.
///
/// # Errors
///
/// `ProcessError::Config` if `config` is out of range, otherwise the error of
/// whichever stage failed.
pub fn process_image(
    bytes: &[u8],
    mime: SourceMime,
    config: &ImageConfig,
) -> Result<ProcessedImage, ProcessError> {
    process_image_cancellable(bytes, mime, config, &CancelToken::new())
}

/// Like [`process_image`], checking `cancel` before decoding and after each
/// stage (decode, resample, quantize when the output is a palette PNG, and
/// encode). Partial results are dropped when cancellation is observed.
pub fn process_image_cancellable(
    bytes: &[u8],
    mime: SourceMime,
    config: &ImageConfig,
    cancel: &CancelToken,
) -> Result<ProcessedImage, ProcessError> {
    config.validate()?;
    cancel.check()?;

    let source = load_image(bytes, mime)?;
    cancel.check()?;

    let raster = resample(&source, config.scale)?;
    drop(source);
    cancel.check()?;

    let encoded = match resolve_encoder(config.format, mime) {
        EncoderKind::IndexedPng => {
            let indexed = quantize(&raster, config.quality)?;
            cancel.check()?;
            encode_quantized(&indexed)?
        }
        EncoderKind::Jpeg | EncoderKind::Png => encode_image(&raster, config, mime)?,
    };
    cancel.check()?;

    log::debug!(
        "processed image: {}x{} {} ({} bytes)",
        raster.width,
        raster.height,
        encoded.mime,
        encoded.bytes.len()
    );

    Ok(ProcessedImage {
        byte_size: encoded.bytes.len(),
        bytes: encoded.bytes,
        width: raster.width,
        height: raster.height,
        mime: encoded.mime,
    })
}

/// Decode a source image and report its dimensions and transparency hint.
pub fn inspect_image(bytes: &[u8], mime: SourceMime) -> Result<SourceInfo, DecodeError> {
    let raster = load_image(bytes, mime)?;
    Ok(SourceInfo {
        width: raster.width,
        height: raster.height,
        mime,
        has_transparency: has_transparency(&raster),
    })
}

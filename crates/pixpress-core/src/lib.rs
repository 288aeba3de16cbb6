//! Pixpress Core - batch image transformation library
//!
//! This crate provides the image pipeline behind pixpress: decoding,
//! resampling, transparency detection, palette quantization and encoding to
//! JPEG, PNG or indexed PNG, plus batch processing and preview bookkeeping.

pub mod batch;
pub mod config;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod preview;
pub mod quantize;
pub mod transparency;

pub use batch::{process_batch, BatchError, BatchItem, BatchOptions};
pub use config::{ConfigError, ImageConfig, OutputFormat};
pub use decode::{DecodeError, RasterImage, SourceMime};
pub use encode::{EncodeError, OutputMime};
pub use pipeline::{
    inspect_image, process_image, process_image_cancellable, CancelToken, ProcessError,
    ProcessedImage, SourceInfo,
};
pub use preview::{ImageItem, ItemStatus, PreviewError, PreviewHandle, PreviewStore};
pub use quantize::{palette_size_for_quality, QuantizationError};
pub use transparency::has_transparency;

//! Raster loading and resampling.
//!
//! This module provides functionality for:
//! - Decoding JPEG, PNG, WebP, GIF and BMP bytes into RGBA rasters
//! - Applying EXIF orientation the way a browser does when drawing an image
//! - Resampling rasters by a scale factor
//!
//! # Architecture
//!
//! The pipeline is designed to be used from Web Workers via WASM bindings or
//! from native worker threads. All operations are synchronous and allocate a
//! fresh raster per call; nothing is cached between calls.
//!
//! # Examples
//!
//! ```ignore
//! use pixpress_core::decode::{load_image, resample, SourceMime};
//!
//! let bytes = std::fs::read("photo.png").unwrap();
//! let image = load_image(&bytes, SourceMime::Png).unwrap();
//! let half = resample(&image, 0.5).unwrap();
//! println!("{}x{} -> {}x{}", image.width, image.height, half.width, half.height);
//! ```

mod load;
mod resize;
mod types;

#[cfg(test)]
pub(crate) use load::fixtures;
pub use load::{get_orientation, load_image, load_image_no_orientation};
pub use resize::{resample, resize, target_dimensions};
pub use types::{DecodeError, Orientation, RasterImage, SourceMime};
pub(crate) use types::expected_len;

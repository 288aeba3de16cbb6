//! Core types for image decoding.

use image::ImageFormat;
use thiserror::Error;

/// Error types for image decoding operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are empty or the format could not be recognized.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The format was recognized but is not a supported still-image format.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoder refused to allocate the image.
    #[error("Out of memory during decoding")]
    OutOfMemory,

    /// A pixel buffer did not match its declared dimensions.
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    PixelDataMismatch { expected: usize, actual: usize },

    /// A zero width or height was requested.
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Container type declared by the caller for a source image.
///
/// Anything the browser reports that is not in this list maps to
/// [`SourceMime::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceMime {
    Jpeg,
    Png,
    Webp,
    Gif,
    Bmp,
    #[default]
    Unknown,
}

impl SourceMime {
    /// Parse a MIME type string. Matching is case-insensitive and ignores
    /// parameters such as `; charset=...`.
    pub fn parse(mime: &str) -> Self {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => SourceMime::Jpeg,
            "image/png" | "image/apng" => SourceMime::Png,
            "image/webp" => SourceMime::Webp,
            "image/gif" => SourceMime::Gif,
            "image/bmp" | "image/x-ms-bmp" => SourceMime::Bmp,
            _ => SourceMime::Unknown,
        }
    }

    /// Canonical MIME string, or `None` for unknown types.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            SourceMime::Jpeg => Some("image/jpeg"),
            SourceMime::Png => Some("image/png"),
            SourceMime::Webp => Some("image/webp"),
            SourceMime::Gif => Some("image/gif"),
            SourceMime::Bmp => Some("image/bmp"),
            SourceMime::Unknown => None,
        }
    }

    /// Whether the container can carry an alpha channel.
    pub fn supports_alpha(self) -> bool {
        matches!(self, SourceMime::Png | SourceMime::Webp | SourceMime::Gif)
    }

    /// The decoder format to fall back on when sniffing fails.
    pub(crate) fn image_format(self) -> Option<ImageFormat> {
        match self {
            SourceMime::Jpeg => Some(ImageFormat::Jpeg),
            SourceMime::Png => Some(ImageFormat::Png),
            SourceMime::Webp => Some(ImageFormat::WebP),
            SourceMime::Gif => Some(ImageFormat::Gif),
            SourceMime::Bmp => Some(ImageFormat::Bmp),
            SourceMime::Unknown => None,
        }
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded raster with straight (non-premultiplied) RGBA pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGBA pixel data in row-major order (4 bytes per pixel, top-left origin).
    /// Length should be width * height * 4.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a new RasterImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            expected_len(width, height),
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Create a RasterImage from caller-supplied data, checking the invariants.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, DecodeError> {
        if width == 0 || height == 0 {
            return Err(DecodeError::InvalidDimensions { width, height });
        }
        let expected = expected_len(width, height);
        if pixels.len() != expected {
            return Err(DecodeError::PixelDataMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster filled with a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(expected_len(width, height))
            .collect();
        Self::new(width, height, pixels)
    }

    /// Create a RasterImage from an image::RgbaImage.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbaImage for further processing.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

pub(crate) fn expected_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * 4
}

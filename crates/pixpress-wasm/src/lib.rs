//! Pixpress WASM - WebAssembly bindings for pixpress
//!
//! This crate provides WASM bindings to expose the pixpress-core pipeline
//! to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `process` - Image processing, inspection and transparency bindings
//! - `preview` - Object-URL previews with guaranteed release
//! - `types` - WASM-compatible wrapper types
//! - `logger` - Forwards `log` records to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { process_image, JsPreview } from '@pixpress/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const out = process_image(bytes, file.type, { quality: 0.6, format: 'image/png-lossy' });
//! const preview = new JsPreview(out.bytes(), out.mime);
//! console.log(`${out.width}x${out.height}, ${out.byte_size} bytes at ${preview.url}`);
//! ```

use wasm_bindgen::prelude::*;

mod logger;
mod preview;
mod process;
mod types;

// Re-export public types
pub use preview::{JsPreview, ObjectUrlStore};
pub use process::{has_transparency, inspect_image, palette_size_for_quality, process_image};
pub use types::{JsImageConfig, JsProcessedImage, JsSourceInfo};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logger::install(log::LevelFilter::Warn);
}

/// Change the console log level (`"off"`, `"error"`, `"warn"`, `"info"`,
/// `"debug"` or `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) -> Result<(), JsValue> {
    let filter = logger::parse_level(level)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown log level: {level}")))?;
    logger::install(filter);
    Ok(())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

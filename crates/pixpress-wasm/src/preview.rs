//! Object-URL previews.
//!
//! A `JsPreview` owns one `blob:` URL. The URL is revoked when the object is
//! freed from JavaScript (or garbage collected), and never before.
//!
//! ```typescript
//! const preview = new JsPreview(out.bytes(), out.mime);
//! img.src = preview.url;
//! // later, when the card is removed
//! preview.free();
//! ```

use js_sys::{Array, Uint8Array};
use pixpress_core::{PreviewError, PreviewHandle, PreviewStore};
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Url};

/// Preview store backed by `URL.createObjectURL`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectUrlStore;

fn describe(value: JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

impl PreviewStore for ObjectUrlStore {
    fn create_url(&self, bytes: &[u8], mime: &str) -> Result<String, PreviewError> {
        let parts = Array::of1(&Uint8Array::from(bytes));
        let options = BlobPropertyBag::new();
        options.set_type(mime);

        let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)
            .map_err(|e| PreviewError::CreateFailed(describe(e)))?;
        Url::create_object_url_with_blob(&blob)
            .map_err(|e| PreviewError::CreateFailed(describe(e)))
    }

    fn revoke_url(&self, url: &str) {
        if let Err(e) = Url::revoke_object_url(url) {
            log::warn!("failed to revoke {url}: {}", describe(e));
        }
    }
}

/// A preview URL for encoded image bytes, revoked on `free()`.
#[wasm_bindgen]
pub struct JsPreview {
    handle: PreviewHandle<ObjectUrlStore>,
}

#[wasm_bindgen]
impl JsPreview {
    /// Create a `blob:` URL serving `bytes` as `mime`.
    #[wasm_bindgen(constructor)]
    pub fn new(bytes: &[u8], mime: &str) -> Result<JsPreview, JsValue> {
        PreviewHandle::create(ObjectUrlStore, bytes, mime)
            .map(|handle| JsPreview { handle })
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// The object URL, valid until this preview is freed.
    #[wasm_bindgen(getter)]
    pub fn url(&self) -> String {
        self.handle.url().to_string()
    }
}

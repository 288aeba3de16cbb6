//! Preview resources and per-image item state.
//!
//! A preview is an externally allocated resource (an object URL in the
//! browser) that must be released exactly once. [`PreviewHandle`] owns one
//! such resource and releases it on drop; it cannot be cloned, so at most one
//! owner can ever release it.
//!
//! [`ImageItem`] is the record a UI keeps per added image: the source bytes,
//! their [`SourceInfo`], the configuration, a status and the source and
//! processed previews. Replacing or dropping a preview releases it.

use thiserror::Error;

use crate::config::{ImageConfig, OutputFormat};
use crate::decode::{DecodeError, SourceMime};
use crate::pipeline::{
    inspect_image, process_image_cancellable, CancelToken, ProcessError, ProcessedImage,
    SourceInfo,
};

/// Errors from a preview store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    #[error("Failed to create preview: {0}")]
    CreateFailed(String),
}

/// Backend that allocates and releases preview URLs.
pub trait PreviewStore {
    /// Allocate a URL that serves `bytes` as `mime`.
    fn create_url(&self, bytes: &[u8], mime: &str) -> Result<String, PreviewError>;

    /// Release a URL created by this store.
    fn revoke_url(&self, url: &str);
}

/// Owned preview URL, revoked when dropped.
#[derive(Debug)]
pub struct PreviewHandle<S: PreviewStore> {
    url: String,
    store: S,
}

impl<S: PreviewStore> PreviewHandle<S> {
    /// Allocate a preview for `bytes` from `store`.
    pub fn create(store: S, bytes: &[u8], mime: &str) -> Result<Self, PreviewError> {
        let url = store.create_url(bytes, mime)?;
        log::trace!("created preview {url}");
        Ok(Self { url, store })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Release the preview now.
    pub fn release(self) {}
}

impl<S: PreviewStore> Drop for PreviewHandle<S> {
    fn drop(&mut self) {
        log::trace!("revoking preview {}", self.url);
        self.store.revoke_url(&self.url);
    }
}

/// Processing state of an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    Pending,
    Processing,
    Done,
    Error(String),
}

/// Errors creating an [`ImageItem`] or attaching a result to it.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// A processed result together with the preview serving its bytes.
#[derive(Debug)]
pub struct ProcessedPreview<S: PreviewStore> {
    pub image: ProcessedImage,
    pub preview: PreviewHandle<S>,
}

/// One source image and everything derived from it.
#[derive(Debug)]
pub struct ImageItem<S: PreviewStore + Clone> {
    id: String,
    name: String,
    bytes: Vec<u8>,
    info: SourceInfo,
    config: ImageConfig,
    format_override: Option<OutputFormat>,
    status: ItemStatus,
    store: S,
    source_preview: PreviewHandle<S>,
    processed: Option<ProcessedPreview<S>>,
}

impl<S: PreviewStore + Clone> ImageItem<S> {
    /// Inspect `bytes` and allocate a source preview.
    ///
    /// # Errors
    ///
    /// `ItemError::Decode` if the bytes are not a loadable image, or
    /// `ItemError::Preview` if the store fails.
    pub fn new(
        store: S,
        id: impl Into<String>,
        name: impl Into<String>,
        bytes: Vec<u8>,
        mime: &str,
        config: ImageConfig,
    ) -> Result<Self, ItemError> {
        let source_mime = SourceMime::parse(mime);
        let info = inspect_image(&bytes, source_mime)?;
        let source_preview = PreviewHandle::create(store.clone(), &bytes, mime)?;

        Ok(Self {
            id: id.into(),
            name: name.into(),
            bytes,
            info,
            config,
            format_override: None,
            status: ItemStatus::Pending,
            store,
            source_preview,
            processed: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    pub fn status(&self) -> &ItemStatus {
        &self.status
    }

    pub fn format_override(&self) -> Option<OutputFormat> {
        self.format_override
    }

    pub fn processed(&self) -> Option<&ProcessedImage> {
        self.processed.as_ref().map(|p| &p.image)
    }

    pub fn source_url(&self) -> &str {
        self.source_preview.url()
    }

    /// The URL to display: the processed output once done, otherwise the
    /// source.
    pub fn preview_url(&self) -> &str {
        match (&self.status, &self.processed) {
            (ItemStatus::Done, Some(p)) => p.preview.url(),
            _ => self.source_preview.url(),
        }
    }

    /// Download name: `processed_<stem>.<ext>`.
    ///
    /// `<stem>` is the source name without its last extension. `<ext>` always
    /// follows the encoded bytes, so an `original` WebP source that was
    /// written as PNG is named `.png`, not `.webp`.
    pub fn output_name(&self) -> Option<String> {
        let processed = self.processed()?;
        let stem = match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => self.name.as_str(),
        };
        Some(format!("processed_{stem}.{}", processed.mime.extension()))
    }

    /// Merge new settings and mark the item for reprocessing.
    ///
    /// The last processed result stays attached until a new one replaces it.
    pub fn update_config(&mut self, config: ImageConfig) {
        self.config = match self.format_override {
            Some(format) => config.with_format(format),
            None => config,
        };
        self.status = ItemStatus::Pending;
    }

    /// Pin this item's output format, or follow `global` again with `None`.
    pub fn set_format_override(&mut self, format: Option<OutputFormat>, global: &ImageConfig) {
        self.format_override = format;
        self.config = self.config.with_format(format.unwrap_or(global.format));
        self.status = ItemStatus::Pending;
    }

    /// Mark the item as in progress. Returns `false` if it already is.
    pub fn begin_processing(&mut self) -> bool {
        if self.status == ItemStatus::Processing {
            return false;
        }
        self.status = ItemStatus::Processing;
        true
    }

    /// Record the outcome of a pipeline run.
    ///
    /// On success the previous processed preview, if any, is released and
    /// replaced. On failure the status carries the message and the previous
    /// result is kept.
    pub fn complete(
        &mut self,
        result: Result<ProcessedImage, ProcessError>,
    ) -> Result<(), ItemError> {
        match result {
            Ok(image) => {
                let mime = image.mime.as_str();
                let preview = match PreviewHandle::create(self.store.clone(), &image.bytes, mime) {
                    Ok(preview) => preview,
                    Err(e) => {
                        self.status = ItemStatus::Error(e.to_string());
                        return Err(e.into());
                    }
                };
                // Assigning drops the old handle, revoking its URL.
                self.processed = Some(ProcessedPreview { image, preview });
                self.status = ItemStatus::Done;
                Ok(())
            }
            Err(e) => {
                log::warn!("processing {} failed: {e}", self.id);
                self.status = ItemStatus::Error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Run the pipeline on this item with its current config.
    ///
    /// Returns `Ok(false)` without doing anything if the item is already
    /// processing.
    pub fn process(&mut self, cancel: &CancelToken) -> Result<bool, ItemError> {
        if !self.begin_processing() {
            return Ok(false);
        }
        let result = process_image_cancellable(&self.bytes, self.info.mime, &self.config, cancel);
        self.complete(result)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::fixtures::{rgba_png, rgba_webp};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Store that hands out sequential URLs and counts revocations per URL.
    #[derive(Debug, Clone, Default)]
    struct CountingStore {
        inner: Rc<RefCell<StoreState>>,
    }

    #[derive(Debug, Default)]
    struct StoreState {
        next: u32,
        live: Vec<String>,
        revoked: HashMap<String, u32>,
        fail_next: bool,
    }

    impl CountingStore {
        fn live(&self) -> Vec<String> {
            self.inner.borrow().live.clone()
        }

        fn revocations(&self, url: &str) -> u32 {
            self.inner.borrow().revoked.get(url).copied().unwrap_or(0)
        }

        fn fail_next(&self) {
            self.inner.borrow_mut().fail_next = true;
        }
    }

    impl PreviewStore for CountingStore {
        fn create_url(&self, _bytes: &[u8], mime: &str) -> Result<String, PreviewError> {
            let mut state = self.inner.borrow_mut();
            if state.fail_next {
                state.fail_next = false;
                return Err(PreviewError::CreateFailed("quota".to_string()));
            }
            state.next += 1;
            let url = format!("blob:test/{}/{mime}", state.next);
            state.live.push(url.clone());
            Ok(url)
        }

        fn revoke_url(&self, url: &str) {
            let mut state = self.inner.borrow_mut();
            state.live.retain(|u| u != url);
            *state.revoked.entry(url.to_string()).or_insert(0) += 1;
        }
    }

    fn opaque_png() -> Vec<u8> {
        rgba_png(4, 2, &[10u8, 20, 30, 255].repeat(8))
    }

    fn new_item(store: &CountingStore) -> ImageItem<CountingStore> {
        ImageItem::new(
            store.clone(),
            "id-1",
            "holiday.photo.png",
            opaque_png(),
            "image/png",
            ImageConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_handle_revokes_once_on_drop() {
        let store = CountingStore::default();
        let handle = PreviewHandle::create(store.clone(), b"x", "image/png").unwrap();
        let url = handle.url().to_string();
        assert_eq!(store.live(), vec![url.clone()]);

        drop(handle);
        assert!(store.live().is_empty());
        assert_eq!(store.revocations(&url), 1);
    }

    #[test]
    fn test_handle_release_is_drop() {
        let store = CountingStore::default();
        let handle = PreviewHandle::create(store.clone(), b"x", "image/png").unwrap();
        let url = handle.url().to_string();
        handle.release();
        assert_eq!(store.revocations(&url), 1);
    }

    #[test]
    fn test_new_item_reads_source_info() {
        let store = CountingStore::default();
        let item = new_item(&store);

        assert_eq!(item.id(), "id-1");
        assert_eq!(item.status(), &ItemStatus::Pending);
        assert_eq!((item.info().width, item.info().height), (4, 2));
        assert_eq!(item.info().mime, SourceMime::Png);
        assert!(item.info().suggests_jpeg());
        assert_eq!(item.preview_url(), item.source_url());
        assert_eq!(store.live().len(), 1);
    }

    #[test]
    fn test_new_item_rejects_undecodable_bytes() {
        let store = CountingStore::default();
        let result = ImageItem::new(
            store.clone(),
            "bad",
            "bad.png",
            vec![1, 2, 3],
            "image/png",
            ImageConfig::default(),
        );
        assert!(matches!(result, Err(ItemError::Decode(_))));
        assert!(store.live().is_empty());
    }

    #[test]
    fn test_process_shows_processed_preview() {
        let store = CountingStore::default();
        let mut item = new_item(&store);

        assert!(item.process(&CancelToken::new()).unwrap());
        assert_eq!(item.status(), &ItemStatus::Done);
        assert_ne!(item.preview_url(), item.source_url());
        assert!(item.preview_url().ends_with("image/jpeg"));
        assert_eq!(item.output_name().as_deref(), Some("processed_holiday.photo.jpg"));
        assert_eq!(store.live().len(), 2);
    }

    #[test]
    fn test_reprocess_revokes_previous_preview_once() {
        let store = CountingStore::default();
        let mut item = new_item(&store);

        item.process(&CancelToken::new()).unwrap();
        let first = item.preview_url().to_string();

        item.update_config(ImageConfig::new(0.5, 0.5, OutputFormat::Png).unwrap());
        assert_eq!(item.status(), &ItemStatus::Pending);
        assert_eq!(item.preview_url(), item.source_url());
        assert_eq!(store.revocations(&first), 0);

        item.process(&CancelToken::new()).unwrap();
        let second = item.preview_url().to_string();
        assert_ne!(first, second);
        assert_eq!(store.revocations(&first), 1);
        assert_eq!(store.revocations(&second), 0);
        assert_eq!(item.processed().unwrap().width, 2);
        assert_eq!(item.output_name().as_deref(), Some("processed_holiday.photo.png"));
    }

    #[test]
    fn test_drop_item_revokes_everything_once() {
        let store = CountingStore::default();
        let mut item = new_item(&store);
        item.process(&CancelToken::new()).unwrap();

        let urls = store.live();
        assert_eq!(urls.len(), 2);
        drop(item);

        assert!(store.live().is_empty());
        for url in urls {
            assert_eq!(store.revocations(&url), 1);
        }
    }

    #[test]
    fn test_failed_run_keeps_previous_result() {
        let store = CountingStore::default();
        let mut item = new_item(&store);
        item.process(&CancelToken::new()).unwrap();
        let done_url = item.preview_url().to_string();

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = item.process(&cancel).unwrap_err();
        assert!(matches!(err, ItemError::Process(ProcessError::Cancelled)));
        assert!(matches!(item.status(), ItemStatus::Error(_)));
        assert!(item.processed().is_some());
        assert_eq!(store.revocations(&done_url), 0);
    }

    #[test]
    fn test_preview_failure_sets_error_status() {
        let store = CountingStore::default();
        let mut item = new_item(&store);
        store.fail_next();

        let err = item.process(&CancelToken::new()).unwrap_err();
        assert!(matches!(err, ItemError::Preview(_)));
        assert_eq!(
            item.status(),
            &ItemStatus::Error("Failed to create preview: quota".to_string())
        );
        assert!(item.processed().is_none());
    }

    #[test]
    fn test_begin_processing_guards_reentry() {
        let store = CountingStore::default();
        let mut item = new_item(&store);
        assert!(item.begin_processing());
        assert!(!item.begin_processing());
        assert!(!item.process(&CancelToken::new()).unwrap());
    }

    #[test]
    fn test_format_override_survives_global_update() {
        let store = CountingStore::default();
        let mut item = new_item(&store);
        let global = ImageConfig::default();

        item.set_format_override(Some(OutputFormat::PngLossy), &global);
        item.update_config(ImageConfig::new(0.3, 1.0, OutputFormat::Jpeg).unwrap());
        assert_eq!(item.config().format, OutputFormat::PngLossy);
        assert_eq!(item.config().quality, 0.3);

        item.set_format_override(None, &global);
        assert_eq!(item.format_override(), None);
        assert_eq!(item.config().format, OutputFormat::Jpeg);
    }

    #[test]
    fn test_output_name_without_extension() {
        let store = CountingStore::default();
        let mut item = ImageItem::new(
            store.clone(),
            "id",
            "scan",
            opaque_png(),
            "image/png",
            ImageConfig::default().with_format(OutputFormat::Original),
        )
        .unwrap();
        assert_eq!(item.output_name(), None);
        item.process(&CancelToken::new()).unwrap();
        assert_eq!(item.output_name().as_deref(), Some("processed_scan.png"));
    }

    #[test]
    fn test_output_name_follows_written_format() {
        let store = CountingStore::default();
        let mut item = ImageItem::new(
            store.clone(),
            "id",
            "sticker.webp",
            rgba_webp(2, 2, &[10u8; 16]),
            "image/webp",
            ImageConfig::default().with_format(OutputFormat::Original),
        )
        .unwrap();
        item.process(&CancelToken::new()).unwrap();
        assert_eq!(item.output_name().as_deref(), Some("processed_sticker.png"));
    }
}

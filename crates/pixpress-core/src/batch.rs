//! Batch processing over a bounded worker pool.
//!
//! Every item runs the full pipeline independently. A failing item produces
//! an error tagged with its id and never affects its siblings. Results come
//! back in input order regardless of how work was scheduled.
//!
//! With the `parallel` feature the batch runs on a dedicated rayon pool;
//! without it (the wasm build) items run one after another.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ImageConfig;
use crate::decode::SourceMime;
use crate::pipeline::{process_image_cancellable, CancelToken, ProcessError, ProcessedImage};

/// One image queued for processing.
#[derive(Debug, Clone)]
pub struct BatchItem<'a> {
    /// Caller-chosen identifier, echoed back in errors.
    pub id: String,
    pub bytes: &'a [u8],
    pub mime: SourceMime,
    pub config: ImageConfig,
    /// Cancelling this token abandons the item at its next stage boundary.
    pub cancel: CancelToken,
}

impl<'a> BatchItem<'a> {
    pub fn new(
        id: impl Into<String>,
        bytes: &'a [u8],
        mime: SourceMime,
        config: ImageConfig,
    ) -> Self {
        Self {
            id: id.into(),
            bytes,
            mime,
            config,
            cancel: CancelToken::new(),
        }
    }
}

/// A pipeline failure tagged with the item it belongs to.
#[derive(Debug, Error)]
#[error("{id}: {error}")]
pub struct BatchError {
    pub id: String,
    #[source]
    pub error: ProcessError,
}

/// Batch runner settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Maximum number of concurrent workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_workers: Option<usize>,
}

/// Resolve the worker count from options.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, never below 1
pub fn effective_workers(options: &BatchOptions) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    options
        .max_workers
        .map(|n| n.min(cores))
        .unwrap_or(cores)
        .max(1)
}

/// Process every item, returning one result per item in input order.
pub fn process_batch(
    items: &[BatchItem<'_>],
    options: &BatchOptions,
) -> Vec<Result<ProcessedImage, BatchError>> {
    let workers = effective_workers(options).min(items.len().max(1));
    log::debug!("processing {} images on {} workers", items.len(), workers);

    let results = run_items(items, workers);

    let failed = results.iter().filter(|r| r.is_err()).count();
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        log::warn!("failed to process {err}");
    }
    log::debug!(
        "batch finished: {} succeeded, {} failed",
        results.len() - failed,
        failed
    );

    results
}

fn process_item(item: &BatchItem<'_>) -> Result<ProcessedImage, BatchError> {
    process_image_cancellable(item.bytes, item.mime, &item.config, &item.cancel).map_err(
        |error| BatchError {
            id: item.id.clone(),
            error,
        },
    )
}

#[cfg(feature = "parallel")]
fn run_items(
    items: &[BatchItem<'_>],
    workers: usize,
) -> Vec<Result<ProcessedImage, BatchError>> {
    use rayon::prelude::*;

    if workers > 1 {
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => return pool.install(|| items.par_iter().map(process_item).collect()),
            Err(e) => log::warn!("worker pool unavailable, running sequentially: {e}"),
        }
    }
    items.iter().map(process_item).collect()
}

#[cfg(not(feature = "parallel"))]
fn run_items(
    items: &[BatchItem<'_>],
    _workers: usize,
) -> Vec<Result<ProcessedImage, BatchError>> {
    items.iter().map(process_item).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::decode::fixtures::rgba_png;

    fn cores() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    fn solid_png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        rgba_png(
            width,
            height,
            &[shade, shade, shade, 255].repeat((width * height) as usize),
        )
    }

    #[test]
    fn test_effective_workers_auto() {
        assert_eq!(effective_workers(&BatchOptions::default()), cores());
    }

    #[test]
    fn test_effective_workers_clamped_to_cores() {
        let options = BatchOptions {
            max_workers: Some(99999),
        };
        assert_eq!(effective_workers(&options), cores());
    }

    #[test]
    fn test_effective_workers_user_constrains_down() {
        let options = BatchOptions {
            max_workers: Some(1),
        };
        assert_eq!(effective_workers(&options), 1);

        let options = BatchOptions {
            max_workers: Some(0),
        };
        assert_eq!(effective_workers(&options), 1);
    }

    #[test]
    fn test_corrupt_item_fails_alone() {
        let good_a = solid_png(20, 10, 40);
        let good_b = solid_png(8, 8, 200);
        let corrupt = b"definitely not an image".to_vec();
        let config = ImageConfig::new(0.8, 0.5, OutputFormat::Png).unwrap();

        let items = vec![
            BatchItem::new("a", &good_a, SourceMime::Png, config),
            BatchItem::new("broken", &corrupt, SourceMime::Png, config),
            BatchItem::new("b", &good_b, SourceMime::Png, config),
        ];
        let results = process_batch(&items, &BatchOptions::default());

        assert_eq!(results.len(), 3);
        let a = results[0].as_ref().unwrap();
        assert_eq!((a.width, a.height), (10, 5));

        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.id, "broken");
        assert!(matches!(err.error, ProcessError::Decode(_)));

        let b = results[2].as_ref().unwrap();
        assert_eq!((b.width, b.height), (4, 4));
    }

    #[test]
    fn test_results_keep_input_order() {
        let sources: Vec<Vec<u8>> = (1..=12u32).map(|n| solid_png(n, 1, n as u8)).collect();
        let config = ImageConfig::new(0.8, 1.0, OutputFormat::Png).unwrap();
        let items: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, bytes)| BatchItem::new(format!("img-{i}"), bytes, SourceMime::Png, config))
            .collect();

        let results = process_batch(&items, &BatchOptions::default());
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.as_ref().unwrap().width, i as u32 + 1);
        }
    }

    #[test]
    fn test_worker_count_does_not_change_results() {
        let sources: Vec<Vec<u8>> = (0..6u8).map(|n| solid_png(16, 12, n * 40)).collect();
        let config = ImageConfig::new(0.4, 0.75, OutputFormat::PngLossy).unwrap();
        let items: Vec<_> = sources
            .iter()
            .map(|bytes| BatchItem::new("x", bytes, SourceMime::Png, config))
            .collect();

        let sequential = process_batch(
            &items,
            &BatchOptions {
                max_workers: Some(1),
            },
        );
        let pooled = process_batch(&items, &BatchOptions::default());

        let sequential: Vec<_> = sequential.into_iter().map(Result::unwrap).collect();
        let pooled: Vec<_> = pooled.into_iter().map(Result::unwrap).collect();
        assert_eq!(sequential, pooled);
    }

    #[test]
    fn test_cancelled_item_reports_cancelled() {
        let bytes = solid_png(4, 4, 9);
        let config = ImageConfig::default();
        let items = vec![
            BatchItem::new("keep", &bytes, SourceMime::Png, config),
            BatchItem::new("drop", &bytes, SourceMime::Png, config),
        ];
        items[1].cancel.cancel();

        let results = process_batch(&items, &BatchOptions::default());
        assert!(results[0].is_ok());
        let err = results[1].as_ref().unwrap_err();
        assert_eq!(err.id, "drop");
        assert!(matches!(err.error, ProcessError::Cancelled));
    }

    #[test]
    fn test_empty_batch() {
        assert!(process_batch(&[], &BatchOptions::default()).is_empty());
    }

    #[test]
    fn test_batch_error_display_names_item() {
        let err = BatchError {
            id: "photo-3".to_string(),
            error: ProcessError::Cancelled,
        };
        assert_eq!(err.to_string(), "photo-3: Processing was cancelled");
    }
}

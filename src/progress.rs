//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive
//! events as the batch driver works through the input directory.
//!
//! # Example
//!
//! ```rust
//! use pdf2md_compare::{AdapterId, BatchConfig, BatchProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, adapter: AdapterId, input: &Path, output: &Path) {
//!         self.done.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("[{adapter}] {} -> {}", input.display(), output.display());
//!     }
//! }
//!
//! let config = BatchConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { done: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use crate::adapter::AdapterId;
use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed one at a time, but the trait is
/// `Send + Sync` so implementations can be shared with other tasks.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once per adapter before the first file is converted.
    ///
    /// # Arguments
    /// * `adapter` — adapter about to run
    /// * `total`   — number of files that will be attempted
    fn on_batch_start(&self, adapter: AdapterId, total: usize) {
        let _ = (adapter, total);
    }

    /// Called just before the external tool is invoked for a file.
    ///
    /// # Arguments
    /// * `index` — 1-indexed position in the batch
    fn on_file_start(&self, adapter: AdapterId, index: usize, total: usize, input: &Path) {
        let _ = (adapter, index, total, input);
    }

    /// Called when a file's markdown has been written.
    fn on_file_complete(&self, adapter: AdapterId, input: &Path, output: &Path) {
        let _ = (adapter, input, output);
    }

    /// Called when a file fails; the batch continues afterwards.
    fn on_file_error(&self, adapter: AdapterId, input: &Path, error: &str) {
        let _ = (adapter, input, error);
    }

    /// Called once per adapter after every file has been attempted.
    fn on_batch_complete(&self, adapter: AdapterId, total: usize, success_count: usize) {
        let _ = (adapter, total, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        batch_success: AtomicUsize,
    }

    impl BatchProgressCallback for TrackingCallback {
        fn on_batch_start(&self, _adapter: AdapterId, total: usize) {
            self.batch_total.store(total, Ordering::SeqCst);
        }

        fn on_file_start(&self, _adapter: AdapterId, _index: usize, _total: usize, _input: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _adapter: AdapterId, _input: &Path, _output: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _adapter: AdapterId, _input: &Path, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _adapter: AdapterId, _total: usize, success_count: usize) {
            self.batch_success.store(success_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        let p = Path::new("a.pdf");
        cb.on_batch_start(AdapterId::Docling, 2);
        cb.on_file_start(AdapterId::Docling, 1, 2, p);
        cb.on_file_complete(AdapterId::Docling, p, Path::new("a_docling.md"));
        cb.on_file_error(AdapterId::Docling, p, "boom");
        cb.on_batch_complete(AdapterId::Docling, 2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        let a = Path::new("a.pdf");
        let b = Path::new("b.pdf");

        tracker.on_batch_start(AdapterId::MinerU, 2);
        tracker.on_file_start(AdapterId::MinerU, 1, 2, a);
        tracker.on_file_complete(AdapterId::MinerU, a, Path::new("a_mineru.md"));
        tracker.on_file_start(AdapterId::MinerU, 2, 2, b);
        tracker.on_file_error(AdapterId::MinerU, b, "mineru exited with status 1");
        tracker.on_batch_complete(AdapterId::MinerU, 2, 1);

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.batch_success.load(Ordering::SeqCst), 1);
    }
}

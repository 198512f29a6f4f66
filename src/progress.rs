//! Progress-callback trait for per-document sync events.
//!
//! Inject an [`Arc<dyn SyncProgressCallback>`] via
//! [`crate::config::SyncConfigBuilder::progress_callback`] to receive events
//! as the batch driver walks the input directory. The CLI uses it to drive an
//! indicatif progress bar; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use md_image_sync::{SyncConfig, SyncProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct UploadCounter {
//!     uploads: AtomicUsize,
//! }
//!
//! impl SyncProgressCallback for UploadCounter {
//!     fn on_image_resolved(&self, _local: &str, _url: &str, uploaded: bool) {
//!         if uploaded {
//!             self.uploads.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(UploadCounter { uploads: AtomicUsize::new(0) });
//! let config = SyncConfig::builder(".")
//!     .access_token("t")
//!     .repo("octocat", "assets")
//!     .progress_callback(counter as Arc<dyn SyncProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the batch driver as it processes each document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in order; documents and images are
/// processed sequentially.
pub trait SyncProgressCallback: Send + Sync {
    /// Called once after the input directory has been listed.
    ///
    /// # Arguments
    /// * `total_documents` — number of `.md` files that will be processed
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is read.
    fn on_document_start(&self, file_name: &str, index: usize, total: usize) {
        let _ = (file_name, index, total);
    }

    /// Called after each image link has been resolved to a remote URL.
    ///
    /// # Arguments
    /// * `local_path` — the `/images/...` path found in the document
    /// * `remote_url` — the download URL that replaces it
    /// * `uploaded`   — `true` when the image was uploaded during this call
    fn on_image_resolved(&self, local_path: &str, remote_url: &str, uploaded: bool) {
        let _ = (local_path, remote_url, uploaded);
    }

    /// Called when a document has been rewritten and written to disk.
    fn on_document_complete(&self, file_name: &str, images_replaced: usize) {
        let _ = (file_name, images_replaced);
    }

    /// Called when a document fails; the batch continues with the next one.
    fn on_document_error(&self, file_name: &str, error: &str) {
        let _ = (file_name, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SyncProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SyncConfig`].
pub type ProgressCallback = Arc<dyn SyncProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        uploads: AtomicUsize,
    }

    impl SyncProgressCallback for TrackingCallback {
        fn on_document_start(&self, _file_name: &str, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_resolved(&self, _local: &str, _url: &str, uploaded: bool) {
            if uploaded {
                self.uploads.fetch_add(1, Ordering::SeqCst);
            }
        }

        fn on_document_complete(&self, _file_name: &str, _images: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_document_error(&self, _file_name: &str, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_document_start("a.md", 1, 2);
        cb.on_image_resolved("/images/a.png", "https://x/a.png", true);
        cb.on_document_complete("a.md", 1);
        cb.on_document_error("b.md", "boom");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_document_start("a.md", 1, 2);
        tracker.on_image_resolved("/images/a.png", "https://x/a.png", true);
        tracker.on_image_resolved("/images/b.png", "https://x/b.png", false);
        tracker.on_document_complete("a.md", 2);
        tracker.on_document_start("b.md", 2, 2);
        tracker.on_document_error("b.md", "upload rejected");

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }
}

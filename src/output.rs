//! Result types produced by a sync run.
//!
//! [`SyncReport`] is serialisable so the CLI can print it with `--json`.

use crate::error::{DocumentError, SyncError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How one image link was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResolution {
    /// Path as written in the document, e.g. `/images/blog/cat.png`.
    pub local_path: String,
    /// Repository-relative path, e.g. `blog/cat.png`.
    pub output_path: String,
    /// Download URL that replaced `local_path`.
    pub remote_url: String,
    /// `true` when the image was uploaded during this run (lookup miss).
    pub uploaded: bool,
}

/// Outcome for one Markdown document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    /// File name, identical in the input and output directories.
    pub file_name: String,
    /// Where the rewritten document was written; `None` on failure.
    pub output_path: Option<PathBuf>,
    /// One entry per distinct image link, in order of first appearance.
    pub images: Vec<ImageResolution>,
    /// Set when the document failed; nothing was written for it.
    pub error: Option<DocumentError>,
}

impl DocumentReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate outcome of [`crate::sync::run`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Per-document results, in processing order.
    pub documents: Vec<DocumentReport>,
    /// Directory entries skipped because they are not `.md` files.
    pub skipped_entries: usize,
    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    /// Images uploaded during this run (lookup misses).
    pub fn uploaded_images(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| d.images.iter())
            .filter(|i| i.uploaded)
            .count()
    }

    /// Images that already existed remotely (lookup hits).
    pub fn reused_images(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| d.images.iter())
            .filter(|i| !i.uploaded)
            .count()
    }

    /// Turn any document failure into [`SyncError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, SyncError> {
        let failed = self.failed();
        if failed > 0 {
            return Err(SyncError::PartialFailure {
                success: self.succeeded(),
                failed,
                total: self.documents.len(),
            });
        }
        Ok(self)
    }
}

//! Error types for the md-image-sync library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`SyncError`] — **Fatal**: the batch cannot proceed at all (missing
//!   credentials, missing input directory) or the caller asked for strict
//!   success. Returned as `Err(SyncError)` from [`crate::sync::run`].
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (image file
//!   missing, upload rejected, output not writable) but every other document
//!   is still processed. Stored inside [`crate::output::DocumentReport`].
//!
//! * [`LookupError`] — the outcome of asking the remote store whether an
//!   asset exists. Only [`LookupError::NotFound`] means "go ahead and
//!   upload"; the other variants stop the document instead of risking a
//!   duplicate upload.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md-image-sync library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// A required environment variable is unset or empty.
    #[error("Missing required setting {name}\nSet it in the environment or in {env_file:?}.")]
    MissingSetting { name: &'static str, env_file: PathBuf },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be constructed.
    #[error("Failed to initialise HTTP client: {0}")]
    HttpClient(String),

    // ── Directory errors ──────────────────────────────────────────────────
    /// The directory holding the Markdown inputs does not exist.
    #[error("Input directory not found: '{path}'")]
    InputDirNotFound { path: PathBuf },

    /// Listing the input directory failed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating the output directory failed.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Batch outcome ─────────────────────────────────────────────────────
    /// Every Markdown document in the batch failed.
    ///
    /// `report` holds the per-document errors for callers that still want
    /// to print them.
    #[error("All {total} documents failed.\nFirst error: {first_error}")]
    AllDocumentsFailed {
        total: usize,
        first_error: String,
        report: Box<crate::output::SyncReport>,
    },

    /// Some documents succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::SyncReport::into_result`] when the caller
    /// wants to treat any document failure as an error.
    #[error("{failed}/{total} documents failed")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a remote lookup did not return an asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The store answered and the path does not exist.
    #[error("'{path}' does not exist in the remote repository")]
    NotFound { path: String },

    /// The store rejected the credentials (HTTP 401/403).
    #[error("Remote store refused access to '{path}' (HTTP {status})")]
    Unauthorized { path: String, status: u16 },

    /// Network failure, unexpected status or malformed response.
    #[error("Lookup of '{path}' failed: {detail}")]
    Transient { path: String, detail: String },
}

impl LookupError {
    /// `true` only when the store positively reported the path as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}

/// A non-fatal error for a single Markdown document.
///
/// The batch records it and moves on to the next document; no output file is
/// written for the failing document.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The Markdown file could not be read (missing, unreadable, not UTF-8).
    #[error("Failed to read '{path}': {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// A referenced `/images/...` file does not exist locally.
    #[error("Image file not found: '{path}'")]
    ImageNotFound { path: PathBuf },

    /// The remote lookup failed for a reason other than "not found".
    #[error("Lookup failed for '{output_path}': {detail}")]
    Lookup { output_path: String, detail: String },

    /// Uploading the image to the remote store failed.
    #[error("Upload of '{output_path}' failed: {detail}")]
    UploadFailed { output_path: String, detail: String },

    /// Writing the rewritten document failed.
    #[error("Failed to write '{path}': {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

//! Batch driver: rewrite every Markdown file in the input directory.
//!
//! Documents are processed one after another, images within a document one
//! after another. Each document has its own error boundary: a failure is
//! logged, recorded in the [`SyncReport`] and the batch moves on. Output is
//! written atomically, so a failed document never leaves a half-written file
//! behind.

use crate::config::SyncConfig;
use crate::error::{DocumentError, SyncError};
use crate::github::{ContentStore, GitHubClient};
use crate::output::{DocumentReport, ImageResolution, SyncReport};
use crate::pipeline::extract::{extract_image_paths, output_path_for};
use crate::pipeline::resolve::Resolver;
use crate::pipeline::rewrite::rewrite_all;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// File extension identifying Markdown documents.
pub const MARKDOWN_EXTENSION: &str = ".md";

/// Process every `.md` file in `config.input_dir` against `store`.
///
/// # Returns
/// `Ok(SyncReport)` even if some documents failed (check
/// [`SyncReport::failed`] or call [`SyncReport::into_result`]).
///
/// # Errors
/// Returns `Err(SyncError)` only for fatal errors:
/// - input directory missing or unreadable
/// - output directory cannot be created
/// - every Markdown document failed
pub async fn run(config: &SyncConfig, store: &dyn ContentStore) -> Result<SyncReport, SyncError> {
    let start = Instant::now();
    info!(
        "Syncing {} → {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    // ── Step 1: List documents ───────────────────────────────────────────
    let (documents, skipped_entries) = list_documents(&config.input_dir).await?;
    debug!(
        "{} markdown documents, {} other entries skipped",
        documents.len(),
        skipped_entries
    );

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| SyncError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(documents.len());
    }

    // ── Step 2: Process each document in isolation ───────────────────────
    let mut resolver = Resolver::new(store);
    let mut reports = Vec::with_capacity(documents.len());
    let total = documents.len();

    for (i, file_name) in documents.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_document_start(file_name, i + 1, total);
        }
        info!("Processing {}", file_name);

        let report = process_document(config, &mut resolver, file_name).await;

        match &report.error {
            None => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_complete(file_name, report.images.len());
                }
            }
            Some(e) => {
                warn!("{}: {}", file_name, e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_document_error(file_name, &e.to_string());
                }
            }
        }
        reports.push(report);
    }

    // ── Step 3: Summarise ────────────────────────────────────────────────
    let report = SyncReport {
        documents: reports,
        skipped_entries,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    let succeeded = report.succeeded();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    if total > 0 && succeeded == 0 {
        let first_error = report
            .documents
            .iter()
            .find_map(|d| d.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(SyncError::AllDocumentsFailed {
            total,
            first_error,
            report: Box::new(report),
        });
    }

    info!(
        "Sync complete: {}/{} documents, {} uploaded, {} reused, {}ms",
        succeeded,
        total,
        report.uploaded_images(),
        report.reused_images(),
        report.duration_ms
    );

    Ok(report)
}

/// Build a [`GitHubClient`] from `config` and run the batch against it.
pub async fn run_with_github(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    let client = GitHubClient::new(config)?;
    run(config, &client).await
}

/// Synchronous wrapper around [`run_with_github`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &SyncConfig) -> Result<SyncReport, SyncError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SyncError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_with_github(config))
}

/// Read, resolve, rewrite and write one document.
///
/// Never returns an error: failures are stored in
/// [`DocumentReport::error`] so the caller can continue with the next
/// document.
pub async fn process_document(
    config: &SyncConfig,
    resolver: &mut Resolver<'_>,
    file_name: &str,
) -> DocumentReport {
    let mut images = Vec::new();
    let result = rewrite_document(config, resolver, file_name, &mut images).await;

    match result {
        Ok(output_path) => DocumentReport {
            file_name: file_name.to_string(),
            output_path: Some(output_path),
            images,
            error: None,
        },
        Err(e) => DocumentReport {
            file_name: file_name.to_string(),
            output_path: None,
            images,
            error: Some(e),
        },
    }
}

async fn rewrite_document(
    config: &SyncConfig,
    resolver: &mut Resolver<'_>,
    file_name: &str,
    images: &mut Vec<ImageResolution>,
) -> Result<PathBuf, DocumentError> {
    let input_path = config.input_dir.join(file_name);
    let markdown = tokio::fs::read_to_string(&input_path)
        .await
        .map_err(|e| DocumentError::ReadFailed {
            path: input_path.clone(),
            detail: e.to_string(),
        })?;

    let local_paths = extract_image_paths(&markdown);
    debug!("{}: {} local image links", file_name, local_paths.len());

    let mut replacements: Vec<(String, String)> = Vec::with_capacity(local_paths.len());
    for local_path in local_paths {
        if replacements.iter().any(|(l, _)| *l == local_path) {
            continue;
        }
        let Some(output_path) = output_path_for(&local_path) else {
            warn!(
                "{}: leaving '{}' untouched, not a file under images/",
                file_name, local_path
            );
            continue;
        };

        let resolved = resolver
            .resolve(&config.local_image_file(&local_path), output_path)
            .await?;
        info!("{} → {}", local_path, resolved.remote_url);

        if let Some(ref cb) = config.progress_callback {
            cb.on_image_resolved(&local_path, &resolved.remote_url, resolved.uploaded);
        }

        images.push(ImageResolution {
            local_path: local_path.clone(),
            output_path: output_path.to_string(),
            remote_url: resolved.remote_url.clone(),
            uploaded: resolved.uploaded,
        });
        replacements.push((local_path, resolved.remote_url));
    }

    let rewritten = rewrite_all(&markdown, replacements.as_slice());

    let output_path = config.output_path_for(file_name);
    write_atomic(&config.output_dir, &output_path, &rewritten).map_err(|e| {
        DocumentError::WriteFailed {
            path: output_path.clone(),
            detail: e.to_string(),
        }
    })?;

    Ok(output_path)
}

/// List `.md` files (sorted by name) and count the entries skipped.
async fn list_documents(input_dir: &Path) -> Result<(Vec<String>, usize), SyncError> {
    if !input_dir.is_dir() {
        return Err(SyncError::InputDirNotFound {
            path: input_dir.to_path_buf(),
        });
    }

    let unreadable = |e: std::io::Error| SyncError::InputDirUnreadable {
        path: input_dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(input_dir).await.map_err(unreadable)?;
    let mut documents = Vec::new();
    let mut skipped = 0;

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let name = entry.file_name().to_string_lossy().to_string();
        // Follows symlinks, so a linked document counts as a file.
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);

        if is_file && name.ends_with(MARKDOWN_EXTENSION) {
            documents.push(name);
        } else {
            debug!("Skipping {}", name);
            skipped += 1;
        }
    }

    documents.sort();
    Ok((documents, skipped))
}

/// Write via a temp file in the same directory, then rename into place.
fn write_atomic(dir: &Path, path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

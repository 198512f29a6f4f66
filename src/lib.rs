//! # md-image-sync
//!
//! Rewrite local image links in Markdown files to stable URLs hosted in a
//! GitHub repository, uploading each image the first time it is seen.
//!
//! ## Why this crate?
//!
//! Markdown written locally references images as `![diagram](/images/a.png)`.
//! Publishing it somewhere that cannot serve `/images/` breaks every picture.
//! This crate pushes the images into a GitHub repository through the contents
//! API and rewrites the links to the files' download URLs. Runs are
//! idempotent: an image that already exists remotely is reused, never
//! uploaded twice.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input_md_files/*.md
//!  │
//!  ├─ 1. Extract  ![alt](/images/...) links (regex)
//!  ├─ 2. Resolve  GET contents → hit: reuse URL / 404: PUT base64 upload
//!  ├─ 3. Rewrite  replace each local path with its URL (longest first)
//!  └─ 4. Output   atomic write to output_md_files/<same name>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md_image_sync::{run_with_github, SyncConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GITHUB_ACCESS_TOKEN / GITHUB_REPO_OWNER / GITHUB_REPO_NAME,
//!     // loading ./.env first when present.
//!     let config = SyncConfig::from_env(".")?.build()?;
//!     let report = run_with_github(&config).await?;
//!     eprintln!("{} uploaded, {} reused",
//!         report.uploaded_images(),
//!         report.reused_images());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md-image-sync` binary (clap + indicatif + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod github;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sync;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SyncConfig, SyncConfigBuilder};
pub use error::{DocumentError, LookupError, SyncError};
pub use github::{ContentStore, GitHubClient, RemoteAsset};
pub use output::{DocumentReport, ImageResolution, SyncReport};
pub use pipeline::extract::{extract_image_paths, output_path_for, LOCAL_IMAGE_ROOT};
pub use pipeline::resolve::{Resolved, Resolver};
pub use pipeline::rewrite::{rewrite, rewrite_all};
pub use progress::{NoopProgressCallback, ProgressCallback, SyncProgressCallback};
pub use sync::{process_document, run, run_sync, run_with_github};

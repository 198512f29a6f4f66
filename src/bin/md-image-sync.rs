//! CLI binary for md-image-sync.
//!
//! A thin shim over the library crate that maps CLI flags to `SyncConfig`,
//! renders progress and prints the summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md_image_sync::{run_with_github, SyncConfig, SyncError, SyncProgressCallback, SyncReport};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over documents, one log line per
/// resolved image and per finished document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl SyncProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_length(total_documents as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Syncing");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_documents} markdown files…"))
        ));
    }

    fn on_document_start(&self, file_name: &str, _index: usize, _total: usize) {
        self.bar.set_message(file_name.to_string());
    }

    fn on_image_resolved(&self, local_path: &str, remote_url: &str, uploaded: bool) {
        let tag = if uploaded { cyan("↑") } else { dim("=") };
        self.bar
            .println(format!("    {tag} {}  {}", local_path, dim(remote_url)));
    }

    fn on_document_complete(&self, file_name: &str, images_replaced: usize) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            file_name,
            dim(&format!("{images_replaced} images"))
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, file_name: &str, error: &str) {
        self.bar
            .println(format!("  {} {}  {}", red("✗"), file_name, red(error)));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, _total_documents: usize, _success_count: usize) {
        self.bar.finish_and_clear();
    }
}

/// Rewrite local image links in Markdown files to GitHub-hosted URLs.
#[derive(Parser, Debug)]
#[command(
    name = "md-image-sync",
    version,
    about = "Rewrite local /images/ links in Markdown files to GitHub-hosted URLs",
    long_about = "Scans <root>/input_md_files for Markdown files, uploads every image linked as \
![alt](/images/...) to a GitHub repository (skipping images that already exist there) and \
writes the rewritten files to <root>/output_md_files.\n\n\
Credentials come from GITHUB_ACCESS_TOKEN, GITHUB_REPO_OWNER and GITHUB_REPO_NAME, read from \
the environment or from <root>/.env.",
    color = clap::ColorChoice::Auto
)]
struct Cli {
    /// Project root containing images/, input_md_files/ and .env.
    #[arg(long, env = "MD_IMAGE_SYNC_ROOT", default_value = ".")]
    root: PathBuf,

    /// Directory of Markdown files to rewrite (default: <root>/input_md_files).
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory for rewritten files (default: <root>/output_md_files).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Branch to read from and commit to (default: repository default branch).
    #[arg(long)]
    branch: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "MD_IMAGE_SYNC_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Print the sync report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-document feedback, so INFO logs are
    // suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and run ─────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    // A fatal error skips `on_batch_complete`; stop the spinner either way.
    let clear_progress = || {
        if let Some(ref p) = progress {
            p.bar.finish_and_clear();
        }
    };

    let config = build_config(&cli, progress.clone()).map_err(|e| {
        clear_progress();
        e
    })?;
    let outcome = run_with_github(&config).await;
    clear_progress();

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            if let SyncError::AllDocumentsFailed { ref report, .. } = e {
                print_report(&cli, &config.output_dir, report)?;
            }
            return Err(e).context("Sync failed");
        }
    };

    print_report(&cli, &config.output_dir, &report)?;
    report.into_result().context("Some files were not rewritten")?;
    Ok(())
}

/// JSON report on stdout (`--json`) and the human summary on stderr.
fn print_report(cli: &Cli, output_dir: &Path, report: &SyncReport) -> Result<()> {
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialise report")?
        );
    }

    if !cli.quiet {
        let failed = report.failed();
        eprintln!(
            "{}  {}/{} files  {} uploaded  {} reused  {}ms  →  {}",
            if failed == 0 { green("✔") } else { cyan("⚠") },
            report.succeeded(),
            report.documents.len(),
            report.uploaded_images(),
            report.reused_images(),
            report.duration_ms,
            bold(&output_dir.display().to_string()),
        );
        for doc in report.documents.iter().filter(|d| !d.is_success()) {
            if let Some(ref e) = doc.error {
                eprintln!("   {} {}: {}", red("✗"), doc.file_name, e);
            }
        }
    }
    Ok(())
}

/// Map CLI args to `SyncConfig`.
fn build_config(cli: &Cli, progress: Option<Arc<CliProgressCallback>>) -> Result<SyncConfig> {
    let mut builder = SyncConfig::from_env(&cli.root)
        .context("Missing GitHub settings")?
        .request_timeout_secs(cli.timeout);

    if let Some(ref dir) = cli.input_dir {
        builder = builder.input_dir(dir);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref branch) = cli.branch {
        builder = builder.branch(branch.clone());
    }
    if let Some(progress) = progress {
        builder = builder.progress_callback(progress);
    }

    builder.build().context("Invalid configuration")
}

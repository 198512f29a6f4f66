//! Configuration types for a sync run.
//!
//! All behaviour is controlled through [`SyncConfig`], built either from the
//! environment ([`SyncConfig::from_env`]) or via [`SyncConfigBuilder`]. The
//! struct is constructed once at startup and passed by reference into the
//! batch driver and the GitHub client; nothing reads the environment after
//! that point.

use crate::error::SyncError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the directory holding the Markdown files to rewrite.
pub const INPUT_DIR_NAME: &str = "input_md_files";

/// Name of the directory receiving the rewritten Markdown files.
pub const OUTPUT_DIR_NAME: &str = "output_md_files";

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub const ENV_ACCESS_TOKEN: &str = "GITHUB_ACCESS_TOKEN";
pub const ENV_REPO_OWNER: &str = "GITHUB_REPO_OWNER";
pub const ENV_REPO_NAME: &str = "GITHUB_REPO_NAME";
pub const ENV_BRANCH: &str = "GITHUB_BRANCH";
pub const ENV_API_URL: &str = "GITHUB_API_URL";

/// Configuration for one sync run.
///
/// # Example
/// ```rust
/// use md_image_sync::SyncConfig;
///
/// let config = SyncConfig::builder("/srv/blog")
///     .access_token("ghp_example")
///     .repo("octocat", "blog-images")
///     .build()
///     .unwrap();
/// assert!(config.input_dir.ends_with("input_md_files"));
/// ```
#[derive(Clone)]
pub struct SyncConfig {
    /// Project root. Local image links such as `/images/a.png` resolve
    /// against it (`<root>/images/a.png`).
    pub project_root: PathBuf,

    /// Directory scanned for `*.md` files. Default: `<root>/input_md_files`.
    pub input_dir: PathBuf,

    /// Directory receiving rewritten files. Default: `<root>/output_md_files`.
    pub output_dir: PathBuf,

    /// GitHub personal access token with `contents: write` on the target repo.
    pub access_token: String,

    /// Owner (user or organisation) of the image repository.
    pub repo_owner: String,

    /// Name of the image repository.
    pub repo_name: String,

    /// Branch to read from and commit to. `None` uses the repository default.
    pub branch: Option<String>,

    /// REST API base URL. Default: [`DEFAULT_API_URL`].
    pub api_url: String,

    /// Per-request timeout in seconds. Default: 30.
    ///
    /// Requests are strictly sequential, so a hung call would otherwise
    /// stall the whole batch.
    pub request_timeout_secs: u64,

    /// Optional progress callback for per-document events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("project_root", &self.project_root)
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("access_token", &"<redacted>")
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("branch", &self.branch)
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SyncProgressCallback>"),
            )
            .finish()
    }
}

impl SyncConfig {
    /// Create a new builder rooted at `project_root`.
    pub fn builder(project_root: impl Into<PathBuf>) -> SyncConfigBuilder {
        let root = project_root.into();
        SyncConfigBuilder {
            config: SyncConfig {
                input_dir: root.join(INPUT_DIR_NAME),
                output_dir: root.join(OUTPUT_DIR_NAME),
                project_root: root,
                access_token: String::new(),
                repo_owner: String::new(),
                repo_name: String::new(),
                branch: None,
                api_url: DEFAULT_API_URL.to_string(),
                request_timeout_secs: 30,
                progress_callback: None,
            },
        }
    }

    /// Load `<root>/.env` (if present) and build the config from the
    /// process environment.
    ///
    /// Fails fast with [`SyncError::MissingSetting`] when any of
    /// `GITHUB_ACCESS_TOKEN`, `GITHUB_REPO_OWNER` or `GITHUB_REPO_NAME` is
    /// missing. Variables already set in the environment win over `.env`.
    pub fn from_env(project_root: impl Into<PathBuf>) -> Result<SyncConfigBuilder, SyncError> {
        let root = project_root.into();
        let env_file = root.join(".env");
        match dotenvy::from_path(&env_file) {
            Ok(()) => debug!("Loaded {}", env_file.display()),
            Err(e) => debug!("No .env loaded from {}: {}", env_file.display(), e),
        }
        Self::from_lookup(root, |name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. [`SyncConfig::from_env`]
    /// passes `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(project_root: PathBuf, lookup: F) -> Result<SyncConfigBuilder, SyncError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_file = project_root.join(".env");
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| {
            get(name).ok_or_else(|| SyncError::MissingSetting {
                name,
                env_file: env_file.clone(),
            })
        };

        let token = required(ENV_ACCESS_TOKEN)?;
        let owner = required(ENV_REPO_OWNER)?;
        let repo = required(ENV_REPO_NAME)?;

        let mut builder = Self::builder(project_root)
            .access_token(token)
            .repo(owner, repo);
        if let Some(branch) = get(ENV_BRANCH) {
            builder = builder.branch(branch);
        }
        if let Some(url) = get(ENV_API_URL) {
            builder = builder.api_url(url);
        }
        Ok(builder)
    }

    /// Local file backing an image link such as `/images/blog/cat.png`.
    pub fn local_image_file(&self, local_path: &str) -> PathBuf {
        self.project_root.join(local_path.trim_start_matches('/'))
    }

    /// Output location for the document named `file_name`.
    pub fn output_path_for(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Builder for [`SyncConfig`].
#[derive(Debug)]
pub struct SyncConfigBuilder {
    config: SyncConfig,
}

impl SyncConfigBuilder {
    pub fn input_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.input_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.config.access_token = token.into();
        self
    }

    pub fn repo(mut self, owner: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.repo_owner = owner.into();
        self.config.repo_name = name.into();
        self
    }

    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = Some(branch.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.config.api_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SyncConfig, SyncError> {
        let c = &self.config;
        if c.access_token.trim().is_empty() {
            return Err(SyncError::InvalidConfig("access token must not be empty".into()));
        }
        if c.repo_owner.trim().is_empty() || c.repo_name.trim().is_empty() {
            return Err(SyncError::InvalidConfig(
                "repository owner and name must not be empty".into(),
            ));
        }
        if c.repo_owner.contains('/') || c.repo_name.contains('/') {
            return Err(SyncError::InvalidConfig(format!(
                "repository must be given as owner + name, got '{}/{}'",
                c.repo_owner, c.repo_name
            )));
        }
        if c.input_dir == c.output_dir {
            return Err(SyncError::InvalidConfig(format!(
                "input and output directories must differ ({})",
                c.input_dir.display()
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_layout_under_root() {
        let c = SyncConfig::builder("/p")
            .access_token("t")
            .repo("o", "r")
            .build()
            .unwrap();
        assert_eq!(c.input_dir, PathBuf::from("/p/input_md_files"));
        assert_eq!(c.output_dir, PathBuf::from("/p/output_md_files"));
        assert_eq!(c.api_url, DEFAULT_API_URL);
        assert_eq!(
            c.local_image_file("/images/blog/cat.png"),
            PathBuf::from("/p/images/blog/cat.png")
        );
    }

    #[test]
    fn from_lookup_reads_required_and_optional() {
        let env = vars(&[
            (ENV_ACCESS_TOKEN, "secret"),
            (ENV_REPO_OWNER, "octocat"),
            (ENV_REPO_NAME, "assets"),
            (ENV_BRANCH, "images"),
            (ENV_API_URL, "https://ghe.example.com/api/v3/"),
        ]);
        let c = SyncConfig::from_lookup(PathBuf::from("/p"), |k| env.get(k).cloned())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(c.repo_owner, "octocat");
        assert_eq!(c.repo_name, "assets");
        assert_eq!(c.branch.as_deref(), Some("images"));
        assert_eq!(c.api_url, "https://ghe.example.com/api/v3");
    }

    #[test]
    fn missing_owner_fails_fast() {
        let env = vars(&[(ENV_ACCESS_TOKEN, "secret"), (ENV_REPO_NAME, "assets")]);
        let err = SyncConfig::from_lookup(PathBuf::from("/p"), |k| env.get(k).cloned())
            .unwrap_err();
        match err {
            SyncError::MissingSetting { name, .. } => assert_eq!(name, ENV_REPO_OWNER),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let env = vars(&[
            (ENV_ACCESS_TOKEN, "   "),
            (ENV_REPO_OWNER, "o"),
            (ENV_REPO_NAME, "r"),
        ]);
        let err = SyncConfig::from_lookup(PathBuf::from("/p"), |k| env.get(k).cloned())
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::MissingSetting {
                name: ENV_ACCESS_TOKEN,
                ..
            }
        ));
    }

    #[test]
    fn debug_redacts_token() {
        let c = SyncConfig::builder("/p")
            .access_token("ghp_supersecret")
            .repo("o", "r")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("ghp_supersecret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn same_input_and_output_rejected() {
        let err = SyncConfig::builder("/p")
            .access_token("t")
            .repo("o", "r")
            .output_dir("/p/input_md_files")
            .build()
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidConfig(_)));
    }
}

//! Remote content store: the GitHub "repository contents" REST API.
//!
//! [`ContentStore`] is the seam between the sync pipeline and the hosting
//! service. [`GitHubClient`] is the production implementation; tests plug in
//! an in-memory store instead.
//!
//! Only two endpoints are used:
//!
//! ```text
//! GET /repos/{owner}/{repo}/contents/{path}[?ref=branch]   lookup
//! PUT /repos/{owner}/{repo}/contents/{path}                create (base64 body)
//! ```

use crate::config::SyncConfig;
use crate::error::{DocumentError, LookupError, SyncError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("md-image-sync/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";

/// A file stored in the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteAsset {
    /// Repository-relative path.
    pub path: String,
    /// Stable URL serving the raw file bytes.
    pub download_url: String,
    /// Git blob SHA, when the store reports one.
    pub sha: Option<String>,
}

/// Read/create access to the remote content store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up the asset stored at `output_path`.
    async fn get_contents(&self, output_path: &str) -> Result<RemoteAsset, LookupError>;

    /// Upload the bytes of `image_path` to `output_path` and return the new asset.
    async fn upload_image(
        &self,
        image_path: &Path,
        output_path: &str,
    ) -> Result<RemoteAsset, DocumentError>;
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: String,
    sha: Option<String>,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    content: ContentsResponse,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    message: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

impl ContentsResponse {
    fn into_asset(self) -> Option<RemoteAsset> {
        let download_url = self.download_url?;
        Some(RemoteAsset {
            path: self.path,
            download_url,
            sha: self.sha,
        })
    }
}

/// GitHub REST client scoped to one repository.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
    branch: Option<String>,
}

impl GitHubClient {
    /// Build a client from the sync configuration.
    pub fn new(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SyncError::HttpClient(e.to_string()))?;

        Url::parse(&config.api_url).map_err(|e| {
            SyncError::InvalidConfig(format!("invalid API URL '{}': {}", config.api_url, e))
        })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: config.access_token.clone(),
            owner: config.repo_owner.clone(),
            repo: config.repo_name.clone(),
            branch: config.branch.clone(),
        })
    }

    /// `{api}/repos/{owner}/{repo}/contents/{path}`, each segment percent-encoded.
    fn contents_url(&self, output_path: &str, with_ref: bool) -> Result<Url, String> {
        let mut url = Url::parse(&self.api_url).map_err(|e| e.to_string())?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| format!("API URL '{}' cannot be a base", self.api_url))?;
            segments
                .pop_if_empty()
                .extend(["repos", self.owner.as_str(), self.repo.as_str(), "contents"])
                .extend(output_path.split('/').filter(|s| !s.is_empty()));
        }
        if with_ref {
            if let Some(ref branch) = self.branch {
                url.query_pairs_mut().append_pair("ref", branch);
            }
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

#[async_trait]
impl ContentStore for GitHubClient {
    async fn get_contents(&self, output_path: &str) -> Result<RemoteAsset, LookupError> {
        let transient = |detail: String| LookupError::Transient {
            path: output_path.to_string(),
            detail,
        };

        let url = self.contents_url(output_path, true).map_err(transient)?;
        debug!("GET {}", url);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(output_path, status, &body));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|e| transient(format!("malformed response: {e}")))?;

        contents
            .into_asset()
            .ok_or_else(|| transient("no download URL (is the path a directory?)".into()))
    }

    async fn upload_image(
        &self,
        image_path: &Path,
        output_path: &str,
    ) -> Result<RemoteAsset, DocumentError> {
        let failed = |detail: String| DocumentError::UploadFailed {
            output_path: output_path.to_string(),
            detail,
        };

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| failed(format!("cannot read {}: {}", image_path.display(), e)))?;

        let body = CreateRequest {
            message: format!("Upload {output_path}"),
            content: STANDARD.encode(&bytes),
            branch: self.branch.as_deref(),
        };

        let url = self.contents_url(output_path, false).map_err(failed)?;
        info!("Uploading {} ({} bytes) to {}", image_path.display(), bytes.len(), url);

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(failed(format!("HTTP {}: {}", status, snippet(&text))));
        }

        let created: CreateResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("malformed response: {e}")))?;

        created
            .content
            .into_asset()
            .ok_or_else(|| failed("response carried no download URL".into()))
    }
}

/// Map a non-success lookup status onto [`LookupError`].
///
/// Only 404 counts as "absent"; credential problems and everything else are
/// kept distinct so they never trigger an upload.
pub fn classify_status(output_path: &str, status: StatusCode, body: &str) -> LookupError {
    match status {
        StatusCode::NOT_FOUND => LookupError::NotFound {
            path: output_path.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LookupError::Unauthorized {
            path: output_path.to_string(),
            status: status.as_u16(),
        },
        _ => LookupError::Transient {
            path: output_path.to_string(),
            detail: format!("HTTP {}: {}", status, snippet(body)),
        },
    }
}

fn snippet(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

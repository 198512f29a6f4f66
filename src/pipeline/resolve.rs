//! Remote resolution: turn an output path into a download URL, uploading
//! the local file only when the store says the path does not exist.
//!
//! ```text
//! cache hit ───────────────────────────────▶ url (no request)
//! lookup ok ───────────────────────────────▶ url (no upload)
//! lookup NotFound ──▶ local file? ──▶ upload ▶ url
//! lookup Unauthorized / Transient ─────────▶ DocumentError::Lookup
//! ```
//!
//! Treating every lookup failure as "absent" would re-upload on a flaky
//! network or with a bad token, so only [`LookupError::NotFound`] proceeds
//! to the upload step.

use crate::error::DocumentError;
use crate::github::ContentStore;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of resolving one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub remote_url: String,
    /// `true` when this call created the remote asset.
    pub uploaded: bool,
}

/// Lookup-or-upload resolver with a per-run memo of resolved URLs.
///
/// The memo means an image referenced from several documents costs one
/// lookup per run, and a second resolution of the same output path can
/// never upload again.
pub struct Resolver<'a> {
    store: &'a dyn ContentStore,
    resolved: HashMap<String, String>,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self {
            store,
            resolved: HashMap::new(),
        }
    }

    /// Resolve `output_path` to a download URL, uploading `local_image_path`
    /// on a lookup miss.
    ///
    /// # Errors
    /// * [`DocumentError::Lookup`] when the store failed for any reason other
    ///   than "not found"
    /// * [`DocumentError::ImageNotFound`] when an upload is needed but the
    ///   local file is missing
    /// * [`DocumentError::UploadFailed`] when the upload itself failed
    pub async fn resolve(
        &mut self,
        local_image_path: &Path,
        output_path: &str,
    ) -> Result<Resolved, DocumentError> {
        if let Some(url) = self.resolved.get(output_path) {
            debug!("{}: already resolved this run", output_path);
            return Ok(Resolved {
                remote_url: url.clone(),
                uploaded: false,
            });
        }

        match self.store.get_contents(output_path).await {
            Ok(asset) => {
                debug!("{}: found remotely", output_path);
                self.remember(output_path, &asset.download_url);
                return Ok(Resolved {
                    remote_url: asset.download_url,
                    uploaded: false,
                });
            }
            Err(e) if e.is_not_found() => {
                debug!("{}: not found remotely, uploading", output_path);
            }
            Err(e) => {
                warn!("{}: lookup failed, not uploading: {}", output_path, e);
                return Err(DocumentError::Lookup {
                    output_path: output_path.to_string(),
                    detail: e.to_string(),
                });
            }
        }

        let is_file = tokio::fs::metadata(local_image_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(DocumentError::ImageNotFound {
                path: local_image_path.to_path_buf(),
            });
        }

        let asset = self.store.upload_image(local_image_path, output_path).await?;
        info!("Uploaded {} → {}", output_path, asset.download_url);
        self.remember(output_path, &asset.download_url);

        Ok(Resolved {
            remote_url: asset.download_url,
            uploaded: true,
        })
    }

    fn remember(&mut self, output_path: &str, url: &str) {
        self.resolved
            .insert(output_path.to_string(), url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::github::RemoteAsset;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory store; `lookup_failure` forces every lookup to fail.
    #[derive(Default)]
    struct MemoryStore {
        assets: Mutex<HashMap<String, String>>,
        lookup_failure: Option<LookupError>,
        lookups: AtomicUsize,
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for MemoryStore {
        async fn get_contents(&self, output_path: &str) -> Result<RemoteAsset, LookupError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if let Some(ref e) = self.lookup_failure {
                return Err(e.clone());
            }
            match self.assets.lock().unwrap().get(output_path) {
                Some(url) => Ok(RemoteAsset {
                    path: output_path.to_string(),
                    download_url: url.clone(),
                    sha: None,
                }),
                None => Err(LookupError::NotFound {
                    path: output_path.to_string(),
                }),
            }
        }

        async fn upload_image(
            &self,
            _image_path: &Path,
            output_path: &str,
        ) -> Result<RemoteAsset, DocumentError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            let url = format!("https://example.com/{output_path}");
            self.assets
                .lock()
                .unwrap()
                .insert(output_path.to_string(), url.clone());
            Ok(RemoteAsset {
                path: output_path.to_string(),
                download_url: url,
                sha: None,
            })
        }
    }

    fn image_file() -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, b"\x89PNG").unwrap();
        f
    }

    #[test]
    fn miss_uploads_then_hit_reuses() {
        let store = MemoryStore::default();
        let img = image_file();

        let first = tokio_test::block_on(Resolver::new(&store).resolve(img.path(), "a/b.png"))
            .unwrap();
        assert!(first.uploaded);
        assert_eq!(first.remote_url, "https://example.com/a/b.png");

        // Fresh resolver: simulates a second run against the same store.
        let second = tokio_test::block_on(Resolver::new(&store).resolve(img.path(), "a/b.png"))
            .unwrap();
        assert!(!second.uploaded);
        assert_eq!(second.remote_url, first.remote_url);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn memo_skips_second_lookup() {
        let store = MemoryStore::default();
        let img = image_file();
        let mut resolver = Resolver::new(&store);

        tokio_test::block_on(resolver.resolve(img.path(), "x.png")).unwrap();
        let again = tokio_test::block_on(resolver.resolve(img.path(), "x.png")).unwrap();

        assert!(!again.uploaded);
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(store.uploads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hit_does_not_need_local_file() {
        let store = MemoryStore::default();
        store
            .assets
            .lock()
            .unwrap()
            .insert("old.png".into(), "https://example.com/old.png".into());

        let r = tokio_test::block_on(
            Resolver::new(&store).resolve(Path::new("/nonexistent/old.png"), "old.png"),
        )
        .unwrap();
        assert_eq!(r.remote_url, "https://example.com/old.png");
        assert!(!r.uploaded);
    }

    #[test]
    fn unauthorized_lookup_never_uploads() {
        let store = MemoryStore {
            lookup_failure: Some(LookupError::Unauthorized {
                path: "a.png".into(),
                status: 401,
            }),
            ..Default::default()
        };
        let img = image_file();

        let err = tokio_test::block_on(Resolver::new(&store).resolve(img.path(), "a.png"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::Lookup { .. }));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transient_lookup_never_uploads() {
        let store = MemoryStore {
            lookup_failure: Some(LookupError::Transient {
                path: "a.png".into(),
                detail: "connection reset".into(),
            }),
            ..Default::default()
        };
        let img = image_file();

        let err = tokio_test::block_on(Resolver::new(&store).resolve(img.path(), "a.png"))
            .unwrap_err();
        assert!(err.to_string().contains("connection reset"));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_local_file_on_miss() {
        let store = MemoryStore::default();
        let err = tokio_test::block_on(
            Resolver::new(&store).resolve(Path::new("/nonexistent/new.png"), "new.png"),
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::ImageNotFound { .. }));
        assert_eq!(store.uploads.load(Ordering::SeqCst), 0);
    }
}

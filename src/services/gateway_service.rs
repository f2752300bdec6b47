//! GatewayService — upload staging and listing on top of the blob-store
//! seam.
//!
//! Uploads are staged in a scratch directory, streamed into the store
//! under a freshly minted key, and the scratch copy is removed on every
//! exit path. Listing aggregates the store's manifest pages, decorates
//! entries with public URLs, and sorts newest-first.

use crate::models::object::StoredObject;
use crate::services::blob_store::BlobStore;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no file provided")]
    NoFileProvided,
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("listing failed: {0}")]
    ListFailed(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// What a successful upload hands back to the caller.
#[derive(Clone, Debug)]
pub struct UploadReceipt {
    /// Raw object key as stored.
    pub key: String,
    /// Key decoded from any store-side percent-encoding, for display.
    pub file_name: String,
    /// Public retrieval URL.
    pub url: String,
}

/// Shared per-request state: an immutable config snapshot plus the store
/// client. Cloning is cheap.
#[derive(Clone)]
pub struct GatewayService {
    store: Arc<dyn BlobStore>,
    pub scratch_dir: PathBuf,
    public_base_url: String,
}

impl GatewayService {
    pub fn new(
        store: Arc<dyn BlobStore>,
        scratch_dir: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            scratch_dir: scratch_dir.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &dyn BlobStore {
        self.store.as_ref()
    }

    /// Stage the incoming byte stream in the scratch directory, stream it
    /// into the blob store, and remove the scratch copy.
    ///
    /// The scratch file is deleted on every path out of this function; a
    /// failed deletion is logged, never surfaced. A stream error (including
    /// a client disconnect mid-body) removes the partial file and the
    /// remote write is never initiated.
    pub async fn store_stream<S>(
        &self,
        file_name: &str,
        content_type: Option<String>,
        stream: S,
    ) -> GatewayResult<UploadReceipt>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let key = mint_key(file_name);
        let scratch_path = self.scratch_dir.join(&key);

        let mut file = File::create(&scratch_path)
            .await
            .map_err(|err| GatewayError::UploadFailed(err.to_string()))?;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.discard_scratch(&scratch_path).await;
                    return Err(GatewayError::UploadFailed(err.to_string()));
                }
            };
            if let Err(err) = file.write_all(&chunk).await {
                self.discard_scratch(&scratch_path).await;
                return Err(GatewayError::UploadFailed(err.to_string()));
            }
        }
        if let Err(err) = file.flush().await {
            self.discard_scratch(&scratch_path).await;
            return Err(GatewayError::UploadFailed(err.to_string()));
        }
        drop(file);

        let outcome = match self
            .store
            .put(&key, &scratch_path, content_type.as_deref())
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                self.discard_scratch(&scratch_path).await;
                return Err(GatewayError::UploadFailed(err.to_string()));
            }
        };
        self.discard_scratch(&scratch_path).await;

        let file_name = urlencoding::decode(&outcome.key)
            .map(|decoded| decoded.into_owned())
            .unwrap_or_else(|_| outcome.key.clone());
        let url = self.public_url(&outcome.key);
        info!(key = %outcome.key, etag = ?outcome.etag, "stored upload");

        Ok(UploadReceipt {
            key: outcome.key,
            file_name,
            url,
        })
    }

    /// Aggregate the full bucket manifest and return it newest-first.
    ///
    /// Any store failure fails the whole call; no partial results.
    pub async fn list_files(&self) -> GatewayResult<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .store
                .list(continuation.as_deref())
                .await
                .map_err(|err| GatewayError::ListFailed(err.to_string()))?;

            objects.extend(page.objects.into_iter().map(|summary| {
                let key = urlencoding::encode(&summary.key).into_owned();
                let url = format!("{}/{}", self.public_base_url, key);
                StoredObject {
                    key,
                    size_bytes: summary.size_bytes,
                    last_modified: summary.last_modified,
                    url,
                }
            }));

            match page.next_token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(objects)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, urlencoding::encode(key))
    }

    async fn discard_scratch(&self, path: &Path) {
        if let Err(err) = fs::remove_file(path).await {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("failed to remove scratch file {}: {}", path.display(), err);
            }
        }
    }
}

/// Mint a collision-resistant object key: receipt timestamp, a random
/// token, and the sanitized original filename. The token keeps two uploads
/// of the same name in the same millisecond from colliding.
fn mint_key(file_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        &token[..8],
        sanitize_file_name(file_name)
    )
}

/// Reduce a client-supplied filename to its final path segment and strip
/// control characters, so minted keys stay single URL path segments.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

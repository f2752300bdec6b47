//! Local-disk [`BlobStore`] backend.
//!
//! Objects live at `root/{bucket}/{key}`. Writes stream through an MD5
//! digest into a uniquely named temp file, fsync, then rename into place,
//! so a crashed upload never leaves a partial object visible. Listing is
//! derived from directory metadata and paginated with base64 continuation
//! tokens.

use crate::services::blob_store::{
    BlobStore, BlobStoreError, BlobStoreResult, ListPage, ObjectSummary, PutOutcome,
};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use md5::Context;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_PAGE_SIZE: usize = 1000;
const TMP_PREFIX: &str = ".tmp-";

pub struct DiskBlobStore {
    root: PathBuf,
    bucket: String,
    page_size: usize,
}

impl DiskBlobStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the manifest page size. Mostly useful in tests.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn bucket_root(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }
}

#[async_trait]
impl BlobStore for DiskBlobStore {
    async fn put(
        &self,
        key: &str,
        source: &Path,
        _content_type: Option<&str>,
    ) -> BlobStoreResult<PutOutcome> {
        let src = File::open(source).await?;

        let bucket_root = self.bucket_root();
        fs::create_dir_all(&bucket_root).await?;
        let final_path = bucket_root.join(key);
        let tmp_path = bucket_root.join(format!("{}{}", TMP_PREFIX, Uuid::new_v4()));
        let mut out = File::create(&tmp_path).await?;

        let mut digest = Context::new();
        let mut chunks = ReaderStream::new(src);
        while let Some(chunk_res) = chunks.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(BlobStoreError::Io(err));
                }
            };
            digest.consume(&chunk);
            if let Err(err) = out.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobStoreError::Io(err));
            }
        }
        if let Err(err) = out.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobStoreError::Io(err));
        }
        if let Err(err) = out.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobStoreError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&final_path).await?;
                fs::rename(&tmp_path, &final_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(BlobStoreError::Io(err));
            }
        }

        let etag = format!("{:x}", digest.compute());
        debug!("stored {} at {}", key, final_path.display());
        Ok(PutOutcome {
            key: key.to_string(),
            etag: Some(etag),
        })
    }

    async fn list(&self, continuation: Option<&str>) -> BlobStoreResult<ListPage> {
        let mut dir = match fs::read_dir(self.bucket_root()).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(ListPage {
                    objects: Vec::new(),
                    next_token: None,
                });
            }
            Err(err) => return Err(BlobStoreError::Io(err)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TMP_PREFIX) {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let last_modified = meta
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or(DateTime::UNIX_EPOCH);
            entries.push(ObjectSummary {
                key: name,
                size_bytes: meta.len() as i64,
                last_modified,
            });
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(token) = continuation {
            let after = decode_continuation_token(token);
            entries.retain(|obj| obj.key.as_str() > after.as_str());
        }

        let truncated = entries.len() > self.page_size;
        entries.truncate(self.page_size);
        let next_token = if truncated {
            entries
                .last()
                .map(|obj| encode_continuation_token(&obj.key))
        } else {
            None
        };

        Ok(ListPage {
            objects: entries,
            next_token,
        })
    }

    async fn probe(&self) -> BlobStoreResult<()> {
        fs::create_dir_all(self.bucket_root()).await?;
        Ok(())
    }
}

fn encode_continuation_token(token: &str) -> String {
    general_purpose::STANDARD.encode(token)
}

fn decode_continuation_token(token: &str) -> String {
    general_purpose::STANDARD
        .decode(token)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| token.to_string())
}

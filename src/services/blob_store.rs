//! The blob-store seam: everything the gateway needs from durable object
//! storage, and nothing more.
//!
//! Implementations open their own read stream over the staged upload so the
//! payload is never buffered in memory, and expose the bucket manifest in
//! pages driven by opaque continuation tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{io, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("put failed: {0}")]
    Put(String),
    #[error("list failed: {0}")]
    List(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// One entry of the bucket manifest.
#[derive(Clone, Debug)]
pub struct ObjectSummary {
    pub key: String,
    pub size_bytes: i64,
    pub last_modified: DateTime<Utc>,
}

/// A page of the bucket manifest. `next_token` is present when further
/// pages remain; feed it back into [`BlobStore::list`] verbatim.
#[derive(Debug)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub next_token: Option<String>,
}

/// Result of a completed write.
#[derive(Clone, Debug)]
pub struct PutOutcome {
    pub key: String,
    pub etag: Option<String>,
}

/// Durable object storage addressed by string keys within one bucket.
///
/// The bucket is fixed at construction time. Writes are atomic from the
/// caller's perspective: either the object exists in full afterwards or the
/// call returns an error and nothing is visible.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the file at `source` under `key`, streaming its bytes.
    /// Overwriting an existing key is last-write-wins.
    async fn put(
        &self,
        key: &str,
        source: &Path,
        content_type: Option<&str>,
    ) -> BlobStoreResult<PutOutcome>;

    /// Fetch one page of the bucket manifest. `continuation` is a token
    /// returned by a previous page, or `None` for the first page.
    async fn list(&self, continuation: Option<&str>) -> BlobStoreResult<ListPage>;

    /// Cheap readiness check against the backing store.
    async fn probe(&self) -> BlobStoreResult<()>;
}

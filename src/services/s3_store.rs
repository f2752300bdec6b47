//! S3-compatible remote [`BlobStore`] backend.
//!
//! Built for vendors that speak the S3 API behind a custom endpoint
//! (Backblaze B2, MinIO, and friends): path-style addressing plus static
//! credentials. `put` streams the staged file from disk via
//! `ByteStream::from_path`, so object size is never bounded by process
//! memory.

use crate::services::blob_store::{
    BlobStore, BlobStoreError, BlobStoreResult, ListPage, ObjectSummary, PutOutcome,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client, Config,
    config::{BehaviorVersion, Credentials, Region, SharedCredentialsProvider},
    primitives::ByteStream,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct S3Config {
    /// Custom endpoint URL; `None` means the stock AWS endpoint.
    pub endpoint: Option<String>,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(cfg: S3Config) -> Self {
        let mut builder = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()));

        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let creds = Credentials::new(
            &cfg.access_key_id,
            &cfg.secret_access_key,
            None,
            None,
            "aviateur-gateway",
        );
        builder = builder.credentials_provider(SharedCredentialsProvider::new(creds));

        Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.bucket,
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        source: &Path,
        content_type: Option<&str>,
    ) -> BlobStoreResult<PutOutcome> {
        let body = ByteStream::from_path(source)
            .await
            .map_err(|err| BlobStoreError::Put(err.to_string()))?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        let response = request
            .send()
            .await
            .map_err(|err| BlobStoreError::Put(err.to_string()))?;

        debug!("put {} into bucket {}", key, self.bucket);
        Ok(PutOutcome {
            key: key.to_string(),
            etag: response.e_tag().map(|etag| etag.trim_matches('"').to_string()),
        })
    }

    async fn list(&self, continuation: Option<&str>) -> BlobStoreResult<ListPage> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation.map(str::to_string))
            .send()
            .await
            .map_err(|err| BlobStoreError::List(err.to_string()))?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let last_modified = obj
                    .last_modified()
                    .map(to_chrono)
                    .unwrap_or(DateTime::UNIX_EPOCH);
                Some(ObjectSummary {
                    key,
                    size_bytes: obj.size().unwrap_or(0),
                    last_modified,
                })
            })
            .collect();

        Ok(ListPage {
            objects,
            next_token: response.next_continuation_token().map(str::to_string),
        })
    }

    async fn probe(&self) -> BlobStoreResult<()> {
        self.client
            .list_objects_v2()
            .bucket(&self.bucket)
            .max_keys(1)
            .send()
            .await
            .map_err(|err| BlobStoreError::List(err.to_string()))?;
        Ok(())
    }
}

fn to_chrono(dt: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()).unwrap_or(DateTime::UNIX_EPOCH)
}

//! End-to-end tests driving the router over the disk-backed store.

use aviateur_gateway::{
    routes::routes::routes,
    services::{
        blob_store::{BlobStore, BlobStoreError, BlobStoreResult, ListPage, PutOutcome},
        disk_store::DiskBlobStore,
        gateway_service::GatewayService,
    },
};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use std::{path::Path, sync::Arc};
use tempfile::TempDir;
use tower::util::ServiceExt;

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";
const PUBLIC_URL: &str = "https://cdn.aviateur.tech";

fn disk_app(scratch: &TempDir, root: &TempDir) -> Router {
    let store = Arc::new(DiskBlobStore::new(root.path(), "uploads"));
    let gateway = GatewayService::new(store, scratch.path(), PUBLIC_URL);
    routes().with_state(gateway)
}

struct FailingStore;

#[async_trait::async_trait]
impl BlobStore for FailingStore {
    async fn put(
        &self,
        _key: &str,
        _source: &Path,
        _content_type: Option<&str>,
    ) -> BlobStoreResult<PutOutcome> {
        Err(BlobStoreError::Put("bucket unreachable".into()))
    }

    async fn list(&self, _continuation: Option<&str>) -> BlobStoreResult<ListPage> {
        Err(BlobStoreError::List("bucket unreachable".into()))
    }

    async fn probe(&self) -> BlobStoreResult<()> {
        Err(BlobStoreError::List("bucket unreachable".into()))
    }
}

fn failing_app(scratch: &TempDir) -> Router {
    let gateway = GatewayService::new(Arc::new(FailingStore), scratch.path(), PUBLIC_URL);
    routes().with_state(gateway)
}

fn upload_request(field_name: &str, file_name: &str, contents: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field_name}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn root_returns_liveness_text() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    let response = app.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Hello world!");
}

#[tokio::test]
async fn upload_then_list_roundtrip() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    let response = app
        .clone()
        .oneshot(upload_request("file", "a.txt", "0123456789"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = json_body(response).await;

    assert_eq!(uploaded["message"], "File uploaded successfully");
    let file_name = uploaded["fileName"].as_str().unwrap();
    let url = uploaded["url"].as_str().unwrap();
    assert!(file_name.ends_with("-a.txt"));
    assert_eq!(
        url,
        format!("{PUBLIC_URL}/{}", urlencoding::encode(file_name))
    );

    // The scratch copy must not outlive the request.
    assert!(dir_is_empty(&scratch));

    let response = app.oneshot(get_request("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let files = json_body(response).await;
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["size"], 10);
    assert_eq!(files[0]["url"].as_str().unwrap(), url);
    assert!(files[0]["lastModified"].is_string());
    // Key round-trips through percent-encoding without loss.
    let key = files[0]["key"].as_str().unwrap();
    assert_eq!(urlencoding::decode(key).unwrap(), file_name);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    let response = app
        .clone()
        .oneshot(upload_request("avatar", "a.txt", "0123456789"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "No file uploaded");

    // No object was created and no scratch residue remains.
    assert!(dir_is_empty(&scratch));
    let response = app.oneshot(get_request("/files")).await.unwrap();
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn duplicate_file_names_get_distinct_keys() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    let first = json_body(
        app.clone()
            .oneshot(upload_request("file", "dup.txt", "one"))
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        app.clone()
            .oneshot(upload_request("file", "dup.txt", "two"))
            .await
            .unwrap(),
    )
    .await;
    assert_ne!(first["fileName"], second["fileName"]);

    let files = json_body(app.oneshot(get_request("/files")).await.unwrap()).await;
    assert_eq!(files.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn listing_is_sorted_and_idempotent() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    for name in ["one.txt", "two.txt", "three.txt"] {
        let response = app
            .clone()
            .oneshot(upload_request("file", name, "contents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let first = json_body(app.clone().oneshot(get_request("/files")).await.unwrap()).await;
    let entries = first.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    let stamps: Vec<chrono::DateTime<chrono::Utc>> = entries
        .iter()
        .map(|entry| {
            entry["lastModified"]
                .as_str()
                .unwrap()
                .parse()
                .unwrap()
        })
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));

    let second = json_body(app.oneshot(get_request("/files")).await.unwrap()).await;
    let keys = |value: &Value| {
        let mut keys: Vec<String> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["key"].as_str().unwrap().to_string())
            .collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&first), keys(&second));
}

#[tokio::test]
async fn store_failure_on_upload_is_500_and_scratch_is_clean() {
    let scratch = TempDir::new().unwrap();
    let app = failing_app(&scratch);

    let response = app
        .oneshot(upload_request("file", "a.txt", "0123456789"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Error uploading file");
    assert!(dir_is_empty(&scratch));
}

#[tokio::test]
async fn store_failure_on_list_returns_no_partial_results() {
    let scratch = TempDir::new().unwrap();
    let app = failing_app(&scratch);

    let response = app.oneshot(get_request("/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Internal server error!");
    assert!(body.get("files").is_none());
}

#[tokio::test]
async fn health_endpoints_report_store_state() {
    let scratch = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let app = disk_app(&scratch, &root);

    let response = app.clone().oneshot(get_request("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get_request("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unready = failing_app(&scratch)
        .oneshot(get_request("/readyz"))
        .await
        .unwrap();
    assert_eq!(unready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

//! HTTP handlers for the upload and listing surface.
//! Streams upload bodies to avoid buffering in memory and delegates
//! storage concerns to `GatewayService`.

use crate::{
    errors::AppError,
    models::object::StoredObject,
    services::gateway_service::{GatewayError, GatewayService},
};
use axum::{Json, extract::Multipart, extract::State};
use futures::StreamExt;
use serde::Serialize;
use std::io;
use tracing::error;

/// `GET /` — plain-text liveness root, kept byte-compatible with the
/// public deployment.
pub async fn root() -> &'static str {
    "Hello world!"
}

/// `POST /upload` — accept a multipart form with one field named `file`.
///
/// The first `file` field is staged and stored; other fields are skipped.
/// No `file` field at all is a client error.
pub async fn upload_file(
    State(gateway): State<GatewayService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                error!(error = %err, "failed to read multipart body");
                return Err(GatewayError::UploadFailed(err.to_string()).into());
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field.content_type().map(str::to_string);
        let stream = field.map(|chunk| {
            chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err))
        });

        return match gateway.store_stream(&file_name, content_type, stream).await {
            Ok(receipt) => Ok(Json(UploadResponse {
                message: "File uploaded successfully".into(),
                file_name: receipt.file_name,
                url: receipt.url,
            })),
            Err(err) => {
                error!(error = %err, "failed to store upload");
                Err(err.into())
            }
        };
    }

    Err(GatewayError::NoFileProvided.into())
}

/// `GET /files` — the bucket manifest, newest first.
pub async fn list_files(
    State(gateway): State<GatewayService>,
) -> Result<Json<Vec<StoredObject>>, AppError> {
    match gateway.list_files().await {
        Ok(files) => Ok(Json(files)),
        Err(err) => {
            error!(error = %err, "failed to list stored files");
            Err(err.into())
        }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    pub url: String,
}

//! Defines routes for the upload/listing gateway.
//!
//! ## Structure
//! - `GET  /`        — plain-text liveness root
//! - `POST /upload`  — single-file multipart upload
//! - `GET  /files`   — bucket manifest, newest first
//! - `GET  /healthz` — liveness probe
//! - `GET  /readyz`  — readiness probe (scratch disk + store)

use crate::{
    handlers::{
        gateway_handlers::{list_files, root, upload_file},
        health_handlers::{healthz, readyz},
    },
    services::gateway_service::GatewayService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router for the whole gateway surface.
///
/// The router carries shared state (`GatewayService`) to all handlers.
/// The default body limit is lifted so upload size is bounded by disk and
/// the remote store, not by the framework.
pub fn routes() -> Router<GatewayService> {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/upload", post(upload_file))
        .route("/files", get(list_files))
        .layer(DefaultBodyLimit::disable())
}

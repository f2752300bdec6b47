use crate::services::gateway_service::GatewayError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NoFileProvided => AppError::new(StatusCode::BAD_REQUEST, "No file uploaded"),
            GatewayError::UploadFailed(_) => AppError::internal("Error uploading file"),
            GatewayError::ListFailed(_) => AppError::internal("Internal server error!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_map_to_status_codes() {
        let no_file: AppError = GatewayError::NoFileProvided.into();
        assert_eq!(no_file.status, StatusCode::BAD_REQUEST);
        assert_eq!(no_file.message, "No file uploaded");

        let upload: AppError = GatewayError::UploadFailed("disk full".into()).into();
        assert_eq!(upload.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upload.message, "Error uploading file");

        let list: AppError = GatewayError::ListFailed("timeout".into()).into();
        assert_eq!(list.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(list.message, "Internal server error!");
    }
}

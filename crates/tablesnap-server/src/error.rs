//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tablesnap_common::{ErrorKind, SnapshotError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Snapshot(e) if e.is_caller_error() => StatusCode::BAD_REQUEST,
            AppError::Snapshot(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, kind) = match &self {
            AppError::Snapshot(e) => {
                if !e.is_caller_error() {
                    tracing::error!(error = %e, kind = ?e.kind(), "Request failed");
                }
                let summary = match e.kind() {
                    ErrorKind::UnknownTable => "Invalid table",
                    ErrorKind::Scan | ErrorKind::Upload => "Ingestion failed",
                    ErrorKind::Listing => "Listing failed",
                    ErrorKind::Configuration => "Server configuration error",
                    ErrorKind::Serialization => "Serialization failed",
                };
                (summary, Some(e.kind()))
            },
            AppError::BadRequest(_) => ("Bad request", None),
        };

        let body = Json(json!({
            "error": error,
            "detail": self.to_string(),
            "kind": kind,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

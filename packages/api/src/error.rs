//! Error responses of the raw HTTP routes.
//!
//! These endpoints answer with small JSON bodies instead of server function
//! errors: `{"error": "..."}` for upload and analyze, and the
//! `{"status", "message"}` envelope for location search.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use store::AnalysisError;
use thiserror::Error;

use crate::blob::BlobError;
use crate::location::LocationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Filename is required")]
    MissingFilename,
    #[error("Upload failed")]
    Upload(#[source] BlobError),
    #[error("Analysis failed")]
    Analysis(#[source] AnalysisError),
    #[error("Analysis failed")]
    InvalidAnalyzeRequest(#[source] serde_json::Error),
    #[error(transparent)]
    Location(#[from] LocationError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingFilename => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": self.to_string() })),
            )
                .into_response(),
            ApiError::Upload(ref e) => {
                tracing::error!("Upload error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ApiError::Analysis(ref e) => {
                tracing::error!("Analysis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ApiError::InvalidAnalyzeRequest(ref e) => {
                tracing::error!("Invalid analyze request: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": self.to_string() })),
                )
                    .into_response()
            }
            ApiError::Location(e) => {
                let status = StatusCode::from_u16(e.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(e.to_response())).into_response()
            }
        }
    }
}

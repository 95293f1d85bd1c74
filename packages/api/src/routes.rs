//! Raw HTTP endpoints mounted next to the Dioxus application.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /api/upload?filename=` | store the request body in public blob storage |
//! | `POST /api/analyze` | analyze `{content}` and return `{analysis}` |
//! | `GET /api/location-search?keyword=` | signed proxy to the place search API |
//!
//! None of them require a session.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use store::Analyzer;

use crate::analysis::ChatAnalyzer;
use crate::blob::{BlobClient, BlobObject};
use crate::error::ApiError;
use crate::location::{LocationClient, LocationSearchResponse};

pub struct RouteState {
    pub analyzer: ChatAnalyzer,
    pub blob: BlobClient,
    pub location: LocationClient,
}

impl RouteState {
    /// State wired to the process-wide clients.
    pub fn from_settings() -> Self {
        Self {
            analyzer: crate::services::analyzer().clone(),
            blob: crate::services::blob_client().clone(),
            location: crate::services::location_client().clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationParams {
    keyword: Option<String>,
}

pub fn router(state: RouteState) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/analyze", post(analyze))
        .route("/api/location-search", get(location_search))
        .with_state(Arc::new(state))
}

async fn upload(
    State(state): State<Arc<RouteState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<BlobObject>, ApiError> {
    let filename = params
        .filename
        .filter(|f| !f.trim().is_empty())
        .ok_or(ApiError::MissingFilename)?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let object = state
        .blob
        .put(&filename, body.to_vec(), content_type)
        .await
        .map_err(ApiError::Upload)?;
    Ok(Json(object))
}

async fn analyze(
    State(state): State<Arc<RouteState>>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request: AnalyzeRequest =
        serde_json::from_slice(&body).map_err(ApiError::InvalidAnalyzeRequest)?;

    let analysis = state
        .analyzer
        .analyze(&request.content)
        .await
        .map_err(ApiError::Analysis)?;
    tracing::info!("Analysis completed ({} chars)", analysis.chars().count());
    Ok(Json(AnalyzeResponse { analysis }))
}

async fn location_search(
    State(state): State<Arc<RouteState>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<LocationSearchResponse>, ApiError> {
    let keyword = params.keyword.unwrap_or_default();
    let items = state.location.search(&keyword).await?;
    Ok(Json(LocationSearchResponse::ok(items)))
}

//! # Public blob storage for avatar images
//!
//! A thin client for the Vercel Blob REST API: `PUT {base_url}/{pathname}` with
//! the raw bytes as body. The JSON answer describes the stored object and its
//! public URL, and is passed through to the uploader unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://blob.vercel-storage.com";
const API_VERSION: &str = "7";

#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlobError {
    #[error("blob storage token is not configured")]
    NotConfigured,
    #[error("invalid blob pathname: {0}")]
    InvalidPathname(String),
    #[error("blob storage returned status {0}")]
    Status(u16),
    #[error("blob request failed: {0}")]
    Request(String),
}

/// A stored object as reported by the blob service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub url: String,
    #[serde(default)]
    pub download_url: Option<String>,
    pub pathname: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_disposition: Option<String>,
}

/// Reject pathnames that are empty or try to escape with `..` segments.
pub fn sanitize_pathname(pathname: &str) -> Result<String, BlobError> {
    let trimmed = pathname.trim().trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return Err(BlobError::InvalidPathname(pathname.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Guess a content type from the file extension.
pub fn content_type_for(pathname: &str) -> &'static str {
    let ext = pathname
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone)]
pub struct BlobClient {
    http: reqwest::Client,
    config: BlobConfig,
}

impl BlobClient {
    pub fn new(config: BlobConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Store `body` publicly under `pathname`.
    pub async fn put(
        &self,
        pathname: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<BlobObject, BlobError> {
        let token = self
            .config
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(BlobError::NotConfigured)?;
        let pathname = sanitize_pathname(pathname)?;
        let content_type = content_type
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| content_type_for(&pathname));

        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), pathname);
        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .header("x-api-version", API_VERSION)
            .header("x-content-type", content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| BlobError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Blob upload of {} failed with {}", pathname, status);
            return Err(BlobError::Status(status.as_u16()));
        }

        let object: BlobObject = response
            .json()
            .await
            .map_err(|e| BlobError::Request(e.to_string()))?;
        tracing::info!("Uploaded blob {}", object.pathname);
        Ok(object)
    }
}

// Upstream statistics API: the request-sender seam, its reqwest
// implementation, and the typed endpoint client built on top of it.

pub mod client;
pub mod http;
pub mod wire;

use async_trait::async_trait;
use thiserror::Error;

pub use client::StatsApi;
pub use http::HttpSender;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("upstream returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// True when the upstream answered with a 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Status { status, .. } => *status == 404,
            ApiError::NotFound(_) => true,
            _ => false,
        }
    }
}

/// Capability for issuing one authenticated GET against the upstream API.
///
/// Implementations attach the bearer token to every call and return the raw
/// response body for success statuses. Any non-success status must surface as
/// [`ApiError::Status`] so callers can treat it the same way as a transport
/// failure.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, url: &str) -> ApiResult<Vec<u8>>;
}

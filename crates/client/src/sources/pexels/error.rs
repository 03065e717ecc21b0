//! Pexels API client error types.

use std::sync::Arc;

/// Errors from the Pexels photo search client.
#[derive(Debug, thiserror::Error)]
pub enum PexelsError {
    /// No API key configured.
    #[error("missing API key: VEHIMG_PEXELS_API_KEY not set")]
    MissingApiKey,

    /// Empty search query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: invalid API key")]
    AuthError,

    /// Monthly or hourly quota exhausted.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for PexelsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { PexelsError::Timeout } else { PexelsError::Network(Arc::new(err)) }
    }
}

//! Pexels stock-photo API client.
//!
//! Last-resort source: generic photographs when neither the search engine
//! nor the marketplace produced anything.
//!
//! ### API contract
//!
//! - **Endpoint**: `https://api.pexels.com/v1/search?query=..&per_page=3`
//! - **Authentication**: API key in the `Authorization` header.
//! - **Timeout**: 10s per request, no retries.
//! - **Normalization**: each photo contributes its `src.large` rendition.

pub mod error;
pub mod response;

pub use error::PexelsError;
pub use response::{Photo, PhotoSrc, PexelsSearchResponse};

use super::{ImageSource, PEXELS_TAG, SourceResult, contain};
use async_trait::async_trait;
use reqwest::header;
use std::sync::Arc;
use std::time::{Duration, Instant};
use vehimg_core::AppConfig;

/// Default base URL for the Pexels API.
const DEFAULT_BASE_URL: &str = "https://api.pexels.com/v1";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Photos requested per query.
const DEFAULT_PER_PAGE: u8 = 3;

/// Pexels client configuration.
#[derive(Debug, Clone)]
pub struct PexelsConfig {
    pub api_key: String,
    /// Base URL (default: https://api.pexels.com/v1).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    pub user_agent: String,
    pub per_page: u8,
}

impl Default for PexelsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("vehimg/{}", env!("CARGO_PKG_VERSION")),
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PexelsConfig {
    /// Build from application config; fails when no key is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PexelsError> {
        let api_key = config.pexels_api_key().ok_or(PexelsError::MissingApiKey)?;
        Ok(Self { api_key: api_key.to_string(), timeout: config.http_timeout(), ..Default::default() })
    }
}

/// Pexels photo search client.
#[derive(Debug, Clone)]
pub struct PexelsClient {
    http: reqwest::Client,
    config: PexelsConfig,
}

impl PexelsClient {
    pub fn new(config: PexelsConfig) -> Result<Self, PexelsError> {
        if config.api_key.trim().is_empty() {
            return Err(PexelsError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PexelsError::Network(Arc::new(e)))?;

        Ok(Self { http, config })
    }

    /// Search photos, returning `src.large` URLs in ranking order.
    pub async fn search_photos(&self, query: &str) -> Result<Vec<String>, PexelsError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PexelsError::InvalidQuery("query is empty".to_string()));
        }

        let start = Instant::now();
        let url = format!("{}/search", self.config.base_url);

        tracing::debug!("searching Pexels API: query={}", query);

        let per_page = self.config.per_page.to_string();
        let http_response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(&[("query", query), ("per_page", per_page.as_str())])
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Pexels API response status: {}", status);

        if status == 401 || status == 403 {
            return Err(PexelsError::AuthError);
        }

        if status == 429 {
            return Err(PexelsError::RateLimited);
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(PexelsError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let api_response: PexelsSearchResponse =
            serde_json::from_slice(&bytes).map_err(|e| PexelsError::Parse(e.to_string()))?;

        tracing::debug!("search completed in {:?}, {} photos", start.elapsed(), api_response.photos.len());

        Ok(api_response.large_urls())
    }
}

#[async_trait]
impl ImageSource for PexelsClient {
    fn tag(&self) -> &'static str {
        PEXELS_TAG
    }

    async fn search(&self, query: &str) -> SourceResult {
        contain(self.tag(), query, self.search_photos(query).await.map_err(Into::into))
    }
}

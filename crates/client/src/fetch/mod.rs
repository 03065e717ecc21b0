//! HTTP fetch pipeline for downloading scraped images.
//!
//! ### URL Canonicalization
//! - Trim whitespace, accept protocol-relative links
//! - Only http/https, fragments removed, query preserved
//!
//! ### SSRF & Safety Gates
//! - Resolve DNS and validate all A/AAAA answers are public.
//! - Redirects are followed by hand so every hop passes the same gate.
//! - Max redirects: 5
//! - Max body bytes: 10MB (configurable)
//! - HTML responses are rejected; a page is not an image

pub mod ssrf;
pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Url;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};

pub use ssrf::{SsrfError, validate_host, validate_ip};
pub use url::{UrlError, canonicalize, resolve_against};

use vehimg_core::{AppConfig, Error};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string; image CDNs often refuse non-browser agents
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 15s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,

    /// Whether to resolve and validate hosts before connecting (default: true)
    pub block_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_millis(15000),
            max_redirects: 5,
            block_private_hosts: true,
        }
    }
}

impl FetchConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_image_bytes,
            timeout: config.download_timeout(),
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The original URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub bytes: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Downloads the bytes behind an image URL.
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, Error>;
}

/// HTTP fetch client with safety checks.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Fetch a URL, returning raw bytes and metadata.
    ///
    /// Performs the SSRF check on the URL and on every redirect target, and
    /// respects redirect/byte limits.
    pub async fn fetch(&self, url_str: &str) -> Result<FetchResponse, Error> {
        let start = Instant::now();
        let url = canonicalize(url_str).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        self.check_destination(&url).await?;

        let mut current = url.clone();
        let mut redirects = 0usize;
        let response = loop {
            let response = self.send(&current).await?;
            if !response.status().is_redirection() {
                break response;
            }

            redirects += 1;
            if redirects > self.config.max_redirects {
                return Err(Error::HttpError(format!("more than {} redirects", self.config.max_redirects)));
            }

            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| Error::HttpError(format!("status {} without location", response.status().as_u16())))?;
            current = self.next_hop(&current, location).await?;
            tracing::debug!(hop = redirects, to = %current, "following redirect");
        };

        let status = response.status();

        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                len, self.config.max_bytes
            )));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ct) = content_type.as_deref()
            && ct.starts_with("text/")
        {
            return Err(Error::HttpError(format!("expected an image, got {ct}")));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(format!("{} body after {:?}", url, self.config.timeout))
            } else {
                Error::HttpError(format!("failed to read response: {}", e))
            }
        })?;

        if bytes.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!(
                "{} bytes exceeds {}",
                bytes.len(),
                self.config.max_bytes
            )));
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url, final_url, status, content_type, bytes, fetch_ms })
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, Error> {
        self.http
            .get(url.as_str())
            .header(header::ACCEPT, "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(format!("{} after {:?}", url, self.config.timeout))
                } else {
                    Error::HttpError(format!("network error: {}", e))
                }
            })
    }

    async fn check_destination(&self, url: &Url) -> Result<(), Error> {
        if self.config.block_private_hosts {
            validate_host(url).await.map_err(|e| Error::SsrfBlocked(e.to_string()))?;
        }
        Ok(())
    }

    /// Resolve a `Location` header against the current URL and gate it.
    async fn next_hop(&self, current: &Url, location: &str) -> Result<Url, Error> {
        let joined = current
            .join(location.trim())
            .map_err(|e| Error::InvalidUrl(format!("bad redirect {location:?}: {e}")))?;
        let next = canonicalize(joined.as_str()).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        self.check_destination(&next).await?;
        Ok(next)
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl ImageDownloader for FetchClient {
    async fn download(&self, url: &str) -> Result<Bytes, Error> {
        Ok(self.fetch(url).await?.bytes)
    }
}

//! Image sources.
//!
//! Every source answers one question: given a query string, which photo URLs
//! does it have? Sources never fail outward. Navigation timeouts, missing
//! markup, HTTP errors and malformed payloads are logged and reported as a
//! miss, so a broken source can only cost time, never abort the chain.
//!
//! The ranked list is fixed: image-search engine, marketplace listings,
//! stock-photo API.

#[cfg(feature = "render")]
pub mod google;
#[cfg(feature = "render")]
pub mod marketplace;
pub mod pexels;

#[cfg(feature = "render")]
pub use google::GoogleImages;
#[cfg(feature = "render")]
pub use marketplace::MarketplaceListings;
pub use pexels::{PexelsClient, PexelsConfig, PexelsError};

#[cfg(feature = "render")]
use crate::render::{BrowserPool, RenderError};

use crate::extract::MAX_CANDIDATES;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use vehimg_core::AppConfig;

pub const GOOGLE_TAG: &str = "google";
pub const WEBMOTORS_TAG: &str = "webmotors";
pub const PEXELS_TAG: &str = "pexels";

/// Outcome of one source search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceResult {
    pub found: bool,
    /// Candidate URLs, most relevant first, at most five.
    pub images: Vec<String>,
}

impl SourceResult {
    pub fn from_images(mut images: Vec<String>) -> Self {
        images.truncate(MAX_CANDIDATES);
        Self { found: !images.is_empty(), images }
    }

    pub fn miss() -> Self {
        Self::default()
    }
}

/// Failures inside a source. Never escapes [`ImageSource::search`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[cfg(feature = "render")]
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Pexels(#[from] PexelsError),

    #[error("invalid search URL: {0}")]
    InvalidUrl(String),

    #[error("search timed out after {0}ms")]
    Timeout(u64),
}

/// One ranked image source.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Stable tag recorded as the `source` of a resolved image.
    fn tag(&self) -> &'static str;

    /// Search for photos of `query`. Infallible by contract.
    async fn search(&self, query: &str) -> SourceResult;
}

/// Convert an internal outcome into a [`SourceResult`], logging failures.
pub(crate) fn contain(tag: &'static str, query: &str, outcome: Result<Vec<String>, SourceError>) -> SourceResult {
    match outcome {
        Ok(images) => {
            let result = SourceResult::from_images(images);
            if result.found {
                tracing::info!(source = tag, query, count = result.images.len(), "images found");
            } else {
                tracing::debug!(source = tag, query, "no images found");
            }
            result
        }
        Err(e) => {
            tracing::warn!(source = tag, query, error = %e, "source failed");
            SourceResult::miss()
        }
    }
}

/// Stand-in for a source that cannot run in this process, e.g. a browser
/// source with rendering disabled or the stock-photo API without a key.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    tag: &'static str,
    reason: String,
}

impl UnavailableSource {
    pub fn new(tag: &'static str, reason: impl Into<String>) -> Self {
        Self { tag, reason: reason.into() }
    }
}

#[async_trait]
impl ImageSource for UnavailableSource {
    fn tag(&self) -> &'static str {
        self.tag
    }

    async fn search(&self, query: &str) -> SourceResult {
        tracing::debug!(source = self.tag, query, reason = %self.reason, "source unavailable");
        SourceResult::miss()
    }
}

/// Builds the ranked source list from configuration.
pub struct SourcesBuilder<'a> {
    config: &'a AppConfig,
    #[cfg(feature = "render")]
    browser: Option<Arc<BrowserPool>>,
}

impl<'a> SourcesBuilder<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "render")]
            browser: None,
        }
    }

    /// Share `browser` between the browser-backed sources.
    #[cfg(feature = "render")]
    pub fn browser(mut self, browser: Arc<BrowserPool>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// The ranked list: google, webmotors, pexels.
    pub fn build(self) -> Vec<Arc<dyn ImageSource>> {
        let mut sources: Vec<Arc<dyn ImageSource>> = Vec::with_capacity(3);

        #[cfg(feature = "render")]
        {
            match self.browser.as_ref().filter(|_| self.config.render_enabled) {
                Some(browser) => {
                    sources.push(Arc::new(GoogleImages::new(Arc::clone(browser), self.config)));
                    sources.push(Arc::new(MarketplaceListings::new(Arc::clone(browser))));
                }
                None => {
                    sources.push(Arc::new(UnavailableSource::new(GOOGLE_TAG, "rendering disabled")));
                    sources.push(Arc::new(UnavailableSource::new(WEBMOTORS_TAG, "rendering disabled")));
                }
            }
        }

        #[cfg(not(feature = "render"))]
        {
            sources.push(Arc::new(UnavailableSource::new(GOOGLE_TAG, "built without render feature")));
            sources.push(Arc::new(UnavailableSource::new(WEBMOTORS_TAG, "built without render feature")));
        }

        let pexels = PexelsConfig::from_app_config(self.config).and_then(PexelsClient::new);
        match pexels {
            Ok(client) => sources.push(Arc::new(client)),
            Err(e) => {
                tracing::warn!(source = PEXELS_TAG, error = %e, "stock-photo source disabled");
                sources.push(Arc::new(UnavailableSource::new(PEXELS_TAG, e.to_string())));
            }
        }

        sources
    }
}

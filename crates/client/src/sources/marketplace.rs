//! Marketplace listing source.
//!
//! Loads the used-vehicle listing page for the query and keeps the photos
//! served from the marketplace's own image host.

use super::{ImageSource, SourceError, SourceResult, WEBMOTORS_TAG, contain};
use crate::extract::{PhotoFilter, images_from_html, select_photos};
use crate::render::{BrowserPool, PageGuard};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const LISTING_BASE: &str = "https://www.webmotors.com.br/comprar/";
const IMAGE_HOST: &str = "webmotors";

/// Photos kept per listing page.
const LISTING_LIMIT: usize = 3;

const LISTING_WAIT: Duration = Duration::from_secs(10);
const LISTING_SETTLE: Duration = Duration::from_secs(2);

/// Listing URL for `query`: words joined by `-` as the last path segment.
pub fn listing_url(query: &str) -> Result<Url, SourceError> {
    let slug = query.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        return Err(SourceError::InvalidUrl("empty query".to_string()));
    }

    let mut url = Url::parse(LISTING_BASE).map_err(|e| SourceError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SourceError::InvalidUrl(LISTING_BASE.to_string()))?
        .pop_if_empty()
        .push(&slug);
    Ok(url)
}

pub struct MarketplaceListings {
    browser: Arc<BrowserPool>,
    filter: PhotoFilter,
}

impl MarketplaceListings {
    pub fn new(browser: Arc<BrowserPool>) -> Self {
        Self { browser, filter: PhotoFilter::marketplace(IMAGE_HOST) }
    }

    async fn collect(&self, query: &str) -> Result<Vec<String>, SourceError> {
        let url = listing_url(query)?;
        let page = self.browser.acquire_page().await?;

        let budget = self.browser.options().navigation_timeout + LISTING_WAIT + LISTING_SETTLE;
        let outcome = tokio::time::timeout(budget, self.collect_on(&page, &url))
            .await
            .unwrap_or_else(|_| Err(SourceError::Timeout(budget.as_millis() as u64)));

        page.close().await;
        outcome
    }

    async fn collect_on(&self, page: &PageGuard, url: &Url) -> Result<Vec<String>, SourceError> {
        page.goto(url.as_str()).await?;
        page.wait_for("img", LISTING_WAIT).await?;
        tokio::time::sleep(LISTING_SETTLE).await;

        let html = page.html().await?;
        let base = page
            .current_url()
            .await?
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or_else(|| url.clone());

        let elements = images_from_html(&html, &base);
        Ok(select_photos(&elements, &self.filter, LISTING_LIMIT))
    }
}

#[async_trait]
impl ImageSource for MarketplaceListings {
    fn tag(&self) -> &'static str {
        WEBMOTORS_TAG
    }

    async fn search(&self, query: &str) -> SourceResult {
        contain(self.tag(), query, self.collect(query).await)
    }
}

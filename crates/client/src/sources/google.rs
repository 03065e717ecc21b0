//! Image-search engine source.
//!
//! Opens the engine's image results for the query, then clicks through the
//! first thumbnails so the preview panel loads the full-size photo. Results
//! pages only carry thumbnails (`encrypted-tbn`), which is why the click is
//! needed at all. When no click yields a photo, whatever the page already
//! shows is run through the same filter.

use super::{GOOGLE_TAG, ImageSource, SourceError, SourceResult, contain};
use crate::extract::{MAX_CANDIDATES, PhotoFilter, select_photos};
use crate::render::{BrowserPool, PageGuard, RenderError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use vehimg_core::AppConfig;

const SEARCH_URL: &str = "https://www.google.com/search";

/// Thumbnails in the results grid.
const THUMBNAIL_SELECTOR: &str = r#"img[src*="encrypted"]"#;

/// Thumbnails clicked at most.
const CLICK_ATTEMPTS: usize = 5;

/// Stop clicking once this many photos are collected.
const ENOUGH_PHOTOS: usize = 3;

const RESULTS_WAIT: Duration = Duration::from_secs(10);
const RESULTS_SETTLE: Duration = Duration::from_secs(3);
const SCROLL_SETTLE: Duration = Duration::from_secs(1);
const PANEL_SETTLE: Duration = Duration::from_secs(3);

/// Results page URL for `query`.
pub fn search_url(query: &str) -> Result<Url, SourceError> {
    Url::parse_with_params(SEARCH_URL, &[("q", query), ("tbm", "isch"), ("hl", "pt-BR")])
        .map_err(|e| SourceError::InvalidUrl(e.to_string()))
}

pub struct GoogleImages {
    browser: Arc<BrowserPool>,
    filter: PhotoFilter,
    limit: usize,
}

impl GoogleImages {
    pub fn new(browser: Arc<BrowserPool>, config: &AppConfig) -> Self {
        let filter = PhotoFilter::search_engine(config.min_url_length, config.min_image_width);
        Self { browser, filter, limit: config.max_candidates.min(MAX_CANDIDATES) }
    }

    /// Upper bound for one search: navigation plus every settle delay.
    fn budget(&self) -> Duration {
        self.browser.options().navigation_timeout
            + RESULTS_WAIT
            + RESULTS_SETTLE
            + SCROLL_SETTLE
            + PANEL_SETTLE * CLICK_ATTEMPTS as u32
    }

    async fn collect(&self, query: &str) -> Result<Vec<String>, SourceError> {
        let url = search_url(query)?;
        let page = self.browser.acquire_page().await?;

        let budget = self.budget();
        let outcome = tokio::time::timeout(budget, self.collect_on(&page, &url))
            .await
            .unwrap_or_else(|_| Err(SourceError::Timeout(budget.as_millis() as u64)));

        page.close().await;
        outcome
    }

    async fn collect_on(&self, page: &PageGuard, url: &Url) -> Result<Vec<String>, SourceError> {
        page.goto(url.as_str()).await?;
        page.wait_for("img", RESULTS_WAIT).await?;
        tokio::time::sleep(RESULTS_SETTLE).await;

        page.scroll_by(300).await?;
        tokio::time::sleep(SCROLL_SETTLE).await;

        let mut photos: Vec<String> = Vec::new();
        for index in 0..CLICK_ATTEMPTS {
            match self.full_size_after_click(page, index).await {
                Ok(Some(photo)) if !photos.contains(&photo) => {
                    tracing::debug!(index, len = photo.len(), "full-size photo found");
                    photos.push(photo);
                }
                Ok(_) => tracing::debug!(index, "no new photo after click"),
                Err(e) => tracing::debug!(index, error = %e, "thumbnail click failed"),
            }

            if photos.len() >= ENOUGH_PHOTOS {
                break;
            }
        }

        if photos.is_empty() {
            let elements = page.images().await?;
            photos = select_photos(&elements, &self.filter, self.limit);
        }

        Ok(photos)
    }

    async fn full_size_after_click(&self, page: &PageGuard, index: usize) -> Result<Option<String>, RenderError> {
        if !page.click_nth(THUMBNAIL_SELECTOR, index).await? {
            return Ok(None);
        }
        tokio::time::sleep(PANEL_SETTLE).await;

        let elements = page.images().await?;
        Ok(select_photos(&elements, &self.filter, 1).into_iter().next())
    }
}

#[async_trait]
impl ImageSource for GoogleImages {
    fn tag(&self) -> &'static str {
        GOOGLE_TAG
    }

    async fn search(&self, query: &str) -> SourceResult {
        contain(self.tag(), query, self.collect(query).await)
    }
}

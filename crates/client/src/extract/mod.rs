//! Photo extraction heuristics.
//!
//! Result pages mix real photographs with thumbnails, logos and UI chrome.
//! A [`PhotoFilter`] decides which image elements count as photographs; the
//! source adapters feed it elements harvested either from the live DOM
//! (with rendered widths) or from static HTML.
//!
//! ### Selection Rules
//! - A non-thumbnail attribute (`data-src`, `data-iurl`) wins over `src`.
//! - Only absolute http(s) URLs; inline `data:` images never qualify.
//! - URLs matching an excluded pattern are dropped (case-insensitive).
//! - URLs shorter than the filter's minimum length are dropped.
//! - When a rendered width is known it must exceed the filter's minimum.
//! - Discovery order is preserved and duplicates removed.

pub mod images;

pub use images::images_from_html;

use serde::Deserialize;
use std::collections::HashSet;

/// Hard cap on candidates any source may report.
pub const MAX_CANDIDATES: usize = 5;

/// URL fragments that identify search-engine thumbnails and page chrome.
pub const SEARCH_ENGINE_EXCLUDED: &[&str] = &[
    "encrypted-tbn",
    "gstatic.com/images",
    "google.com/images/branding",
    "googlelogo",
    "favicon",
    "logo",
    "icon",
    "sprite",
];

/// URL fragments that identify marketplace chrome rather than listing photos.
pub const MARKETPLACE_EXCLUDED: &[&str] = &["favicon", "logo", "icon", "sprite", "placeholder"];

/// An `<img>` element as seen on a result page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(default)]
    pub src: Option<String>,
    /// Full-size URL from `data-src`/`data-iurl`, when the page lazy-loads.
    #[serde(default)]
    pub data_src: Option<String>,
    /// Rendered (natural) width in pixels, if known.
    #[serde(default)]
    pub width: Option<u32>,
}

impl ImageElement {
    pub fn with_src(src: impl Into<String>) -> Self {
        Self { src: Some(src.into()), ..Default::default() }
    }

    /// The attribute worth keeping: lazy-load targets beat thumbnails.
    pub fn preferred_url(&self) -> Option<&str> {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().map(str::trim).filter(|s| !s.is_empty())
        }
        match non_empty(&self.data_src) {
            Some(data_src) if !data_src.starts_with("data:") => Some(data_src),
            _ => non_empty(&self.src),
        }
    }
}

/// Heuristic separating photographs from icons and thumbnails.
#[derive(Debug, Clone, Default)]
pub struct PhotoFilter {
    pub excluded_patterns: Vec<String>,
    pub min_url_length: usize,
    /// Elements with a known width at or below this are icons.
    pub min_width: Option<u32>,
    /// When set, the URL must contain this (e.g. the marketplace CDN host).
    pub required_substring: Option<String>,
}

impl PhotoFilter {
    /// Filter for image-search result pages.
    pub fn search_engine(min_url_length: usize, min_width: u32) -> Self {
        Self {
            excluded_patterns: SEARCH_ENGINE_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            min_url_length,
            min_width: Some(min_width),
            required_substring: None,
        }
    }

    /// Filter for listing pages, keeping only images served from `host`.
    pub fn marketplace(host: &str) -> Self {
        Self {
            excluded_patterns: MARKETPLACE_EXCLUDED.iter().map(|s| s.to_string()).collect(),
            min_url_length: 0,
            min_width: None,
            required_substring: Some(host.to_lowercase()),
        }
    }

    /// Whether a bare URL passes the URL-level rules.
    pub fn accepts_url(&self, url: &str) -> bool {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return false;
        }
        if url.len() < self.min_url_length {
            return false;
        }

        let lowered = url.to_lowercase();
        if self.excluded_patterns.iter().any(|p| lowered.contains(p.as_str())) {
            return false;
        }

        match self.required_substring.as_deref() {
            Some(needle) => lowered.contains(needle),
            None => true,
        }
    }

    /// The photo URL for `element`, or `None` if it looks like chrome.
    pub fn pick<'a>(&self, element: &'a ImageElement) -> Option<&'a str> {
        if let (Some(min), Some(width)) = (self.min_width, element.width)
            && width <= min
        {
            return None;
        }

        element.preferred_url().filter(|url| self.accepts_url(url))
    }
}

/// Apply `filter` to `elements`, returning at most `limit` distinct URLs in
/// discovery order.
pub fn select_photos(elements: &[ImageElement], filter: &PhotoFilter, limit: usize) -> Vec<String> {
    let limit = limit.min(MAX_CANDIDATES);
    let mut seen = HashSet::new();
    let mut photos = Vec::new();

    for element in elements {
        if photos.len() >= limit {
            break;
        }
        let Some(url) = filter.pick(element) else { continue };
        if seen.insert(url) {
            photos.push(url.to_string());
        }
    }

    photos
}

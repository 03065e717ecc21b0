//! Fallback chain across query variations and ranked sources.

use crate::sources::ImageSource;
use serde::Serialize;
use std::sync::Arc;

/// The first successful (variation, source) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedImage {
    pub image_url: String,
    pub all_images: Vec<String>,
    pub source: String,
    /// Variation that produced the hit.
    #[serde(skip)]
    pub query: String,
}

/// Drives variations × sources strictly in sequence.
///
/// Outer loop is the variation, inner loop the source: every source gets
/// the most specific query before any source sees a degraded one.
pub struct FallbackOrchestrator {
    sources: Vec<Arc<dyn ImageSource>>,
}

impl FallbackOrchestrator {
    pub fn new(sources: Vec<Arc<dyn ImageSource>>) -> Self {
        Self { sources }
    }

    /// Source tags in priority order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.tag()).collect()
    }

    pub async fn resolve(&self, variations: &[String]) -> Option<ResolvedImage> {
        for variation in variations {
            for source in &self.sources {
                tracing::debug!(variation = %variation, source = source.tag(), "trying source");

                let result = source.search(variation).await;
                let Some(first) = result.images.first().filter(|_| result.found) else {
                    continue;
                };

                tracing::info!(variation = %variation, source = source.tag(), "image resolved");
                return Some(ResolvedImage {
                    image_url: first.clone(),
                    all_images: result.images.clone(),
                    source: source.tag().to_string(),
                    query: variation.clone(),
                });
            }
        }

        tracing::info!(variations = variations.len(), "all sources exhausted");
        None
    }
}

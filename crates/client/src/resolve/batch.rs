//! Sequential, failure-isolated batch resolution.

use super::service::{Resolution, Resolve};
use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

const ITEM_NOT_FOUND: &str = "Image not found";
const ITEM_INTERNAL_ERROR: &str = "internal error while resolving vehicle";

/// Outcome for one name in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub vehicle_name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn failed(vehicle_name: &str, error: impl Into<String>) -> Self {
        Self {
            vehicle_name: vehicle_name.to_string(),
            success: false,
            image_url: None,
            source: None,
            cached: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate batch outcome. `successful + failed == total == results.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BatchItem>,
}

impl BatchReport {
    fn from_items(results: Vec<BatchItem>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self { total: results.len(), successful, failed: results.len() - successful, results }
    }
}

/// Resolves names one at a time; one bad item never affects the others.
pub struct BatchRunner<R: ?Sized> {
    resolver: Arc<R>,
}

impl<R: Resolve + ?Sized> BatchRunner<R> {
    pub fn new(resolver: Arc<R>) -> Self {
        Self { resolver }
    }

    pub async fn resolve_all(&self, names: &[String]) -> BatchReport {
        tracing::info!(total = names.len(), "batch started");

        let mut results = Vec::with_capacity(names.len());
        for name in names {
            results.push(self.resolve_one(name).await);
        }

        let report = BatchReport::from_items(results);
        tracing::info!(total = report.total, successful = report.successful, failed = report.failed, "batch finished");
        report
    }

    async fn resolve_one(&self, name: &str) -> BatchItem {
        let outcome = AssertUnwindSafe(self.resolver.resolve(name)).catch_unwind().await;

        match outcome {
            Ok(Ok(Resolution::Found(vehicle))) => BatchItem {
                vehicle_name: name.to_string(),
                success: true,
                image_url: Some(vehicle.image_url),
                source: Some(vehicle.source),
                cached: Some(vehicle.cached),
                error: None,
            },
            Ok(Ok(Resolution::NotFound(_))) => BatchItem::failed(name, ITEM_NOT_FOUND),
            Ok(Err(e)) if e.is_validation() => BatchItem::failed(name, e.to_string()),
            Ok(Err(e)) => {
                tracing::error!(vehicle = name, error = %e, "batch item failed");
                BatchItem::failed(name, ITEM_INTERNAL_ERROR)
            }
            Err(_) => {
                tracing::error!(vehicle = name, "batch item panicked");
                BatchItem::failed(name, ITEM_INTERNAL_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::orchestrator::tests::{CallLog, ScriptedSource};
    use crate::resolve::service::ResolvedVehicle;
    use crate::resolve::service::tests::{FakeBlobs, MemoryCache, service};
    use async_trait::async_trait;
    use vehimg_core::{Error, VehicleCategory};

    /// Resolver that panics on "boom", errors on "db down", misses on
    /// "unknown" and finds everything else.
    struct Scripted;

    #[async_trait]
    impl Resolve for Scripted {
        async fn resolve(&self, raw_name: &str) -> Result<Resolution, Error> {
            match raw_name {
                "boom" => panic!("adapter bug"),
                "db down" => Err(Error::MigrationFailed("disk full".to_string())),
                "unknown" => Ok(Resolution::NotFound(Default::default())),
                "" => Err(Error::InvalidInput("vehicle name is required".to_string())),
                _ => Ok(Resolution::Found(ResolvedVehicle {
                    image_url: format!("https://img.test/{}.jpg", raw_name.replace(' ', "_")),
                    original_name: raw_name.to_string(),
                    normalized_name: raw_name.to_lowercase(),
                    vehicle_type: VehicleCategory::Car,
                    year: None,
                    source: "google".to_string(),
                    cached: false,
                    all_images: vec![],
                    created_at: None,
                })),
            }
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_one_panic_is_isolated() {
        let runner = BatchRunner::new(Arc::new(Scripted));
        let report = runner.resolve_all(&names(&["fiat uno", "boom", "honda civic"])).await;

        assert_eq!(report.total, 3);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.successful + report.failed, report.total);

        assert!(report.results[0].success);
        assert!(!report.results[1].success);
        assert_eq!(report.results[1].vehicle_name, "boom");
        assert_eq!(report.results[1].error.as_deref(), Some(ITEM_INTERNAL_ERROR));
        assert!(report.results[2].success);
    }

    #[tokio::test]
    async fn test_errors_and_misses_become_items() {
        let runner = BatchRunner::new(Arc::new(Scripted));
        let report = runner.resolve_all(&names(&["db down", "unknown", "", "vw gol"])).await;

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 3);
        assert_eq!(report.results[0].error.as_deref(), Some(ITEM_INTERNAL_ERROR));
        assert_eq!(report.results[1].error.as_deref(), Some(ITEM_NOT_FOUND));
        assert!(report.results[2].error.as_deref().unwrap().starts_with("INVALID_INPUT"));
        assert_eq!(report.results[3].image_url.as_deref(), Some("https://img.test/vw_gol.jpg"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let runner = BatchRunner::new(Arc::new(Scripted));
        let report = runner.resolve_all(&[]).await;
        assert_eq!(report, BatchReport { total: 0, successful: 0, failed: 0, results: vec![] });
    }

    #[tokio::test]
    async fn test_batch_uses_cache_then_sources() {
        let calls = CallLog::default();
        let cache = std::sync::Arc::new(MemoryCache::default());
        let svc = Arc::new(service(
            Arc::clone(&cache),
            Arc::new(FakeBlobs::default()),
            false,
            vec![Arc::new(ScriptedSource::new("google", &calls).hit("fiat uno", &["https://g/uno.jpg"]))],
        ));
        let runner = BatchRunner::new(Arc::clone(&svc));

        let first = runner.resolve_all(&names(&["Fiat Uno"])).await;
        assert_eq!(first.results[0].cached, Some(false));
        svc.drain().await;

        let second = runner.resolve_all(&names(&["fiat uno", "Opala"])).await;
        assert_eq!(second.results[0].cached, Some(true));
        assert!(!second.results[1].success);
        assert_eq!(second.successful + second.failed, 2);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_item_body_shape() {
        let item = BatchItem::failed("boom", "Image not found");
        let body = serde_json::to_value(&item).unwrap();
        assert_eq!(body["vehicleName"], "boom");
        assert_eq!(body["success"], false);
        assert!(body.get("imageUrl").is_none());
    }
}

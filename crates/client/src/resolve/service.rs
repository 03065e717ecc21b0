//! Cache-aside resolution with deferred persistence.
//!
//! ### Request path
//! 1. Normalize the raw name into the cache key.
//! 2. Cache hit: answer immediately. A failing lookup counts as a miss.
//! 3. Cache miss: run the fallback chain over the query variations.
//! 4. Answer the caller.
//!
//! ### Background path
//! Download the winning image, store it as a blob and append a cache record
//! pointing at the blob. When the download or the blob write fails the
//! record points at the scraped URL instead. Errors end in the log.

use super::background::BackgroundTasks;
use super::orchestrator::{FallbackOrchestrator, ResolvedImage};
use crate::fetch::ImageDownloader;
use crate::sources::ImageSource;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use vehimg_core::name::generate_search_variations;
use vehimg_core::store::blob_file_name;
use vehimg_core::{BlobStore, CacheRecord, CacheStore, Error, VehicleCategory, VehicleDescriptor};

const NOT_FOUND_MESSAGE: &str = "Could not find images for this vehicle";

const NOT_FOUND_SUGGESTIONS: &[&str] = &[
    "Check that the vehicle name is spelled correctly",
    "Try a more generic name (e.g. only brand and model)",
    "Try again later",
];

/// A resolved vehicle image, fresh or from the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVehicle {
    pub image_url: String,
    pub original_name: String,
    pub normalized_name: String,
    pub vehicle_type: VehicleCategory,
    pub year: Option<String>,
    pub source: String,
    pub cached: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl ResolvedVehicle {
    fn from_record(record: CacheRecord) -> Self {
        Self {
            image_url: record.image_url,
            original_name: record.original_name,
            normalized_name: record.normalized_key,
            vehicle_type: record.category,
            year: record.year,
            source: record.source,
            cached: true,
            all_images: record.all_images,
            created_at: Some(record.created_at),
        }
    }

    fn scraped(descriptor: &VehicleDescriptor, resolved: &ResolvedImage) -> Self {
        Self {
            image_url: resolved.image_url.clone(),
            original_name: descriptor.original_name.clone(),
            normalized_name: descriptor.normalized_key.clone(),
            vehicle_type: descriptor.category,
            year: descriptor.year.clone(),
            source: resolved.source.clone(),
            cached: false,
            all_images: resolved.all_images.clone(),
            created_at: None,
        }
    }
}

/// Every source came back empty. Not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotFound {
    pub error: String,
    pub suggestions: Vec<String>,
}

impl Default for NotFound {
    fn default() -> Self {
        Self {
            error: NOT_FOUND_MESSAGE.to_string(),
            suggestions: NOT_FOUND_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(ResolvedVehicle),
    NotFound(NotFound),
}

/// Anything that can resolve one raw vehicle name.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, raw_name: &str) -> Result<Resolution, Error>;
}

/// Storage and download collaborators used by the background path.
#[derive(Clone)]
struct Persistence {
    cache: Arc<dyn CacheStore>,
    blobs: Arc<dyn BlobStore>,
    downloader: Arc<dyn ImageDownloader>,
}

impl Persistence {
    /// Store the image and append its cache record, returning the record id.
    ///
    /// A failed download does not abort persistence. It is handled like a
    /// failed blob write: the record is still appended, pointing at the
    /// scraped URL, so the next request for the key is a cache hit.
    async fn persist(&self, descriptor: &VehicleDescriptor, resolved: &ResolvedImage) -> Result<String, Error> {
        let image_url = match self.store_blob(descriptor, &resolved.image_url).await {
            Ok(blob_url) => blob_url,
            Err(e) => {
                tracing::warn!(error = %e, "blob storage failed, caching scraped URL");
                resolved.image_url.clone()
            }
        };

        let record = CacheRecord::new(descriptor, &image_url, &resolved.source, resolved.all_images.clone());
        let id = self.cache.put(&record).await?;
        tracing::info!(id = %id, image_url = %image_url, "cache record written");
        Ok(id)
    }

    async fn store_blob(&self, descriptor: &VehicleDescriptor, image_url: &str) -> Result<String, Error> {
        let bytes = self.downloader.download(image_url).await?;
        let name = blob_file_name(&descriptor.normalized_key, chrono::Utc::now().timestamp_millis());
        self.blobs.put(&bytes, &name).await
    }
}

pub struct ResolutionService {
    persistence: Persistence,
    orchestrator: FallbackOrchestrator,
    background: BackgroundTasks,
}

impl ResolutionService {
    pub fn new(
        cache: Arc<dyn CacheStore>, blobs: Arc<dyn BlobStore>, downloader: Arc<dyn ImageDownloader>,
        sources: Vec<Arc<dyn ImageSource>>,
    ) -> Self {
        Self {
            persistence: Persistence { cache, blobs, downloader },
            orchestrator: FallbackOrchestrator::new(sources),
            background: BackgroundTasks::new(),
        }
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    /// Wait for pending background persistence.
    pub async fn drain(&self) {
        self.background.drain().await;
    }

    pub fn pending_persists(&self) -> usize {
        self.background.pending()
    }

    async fn cached(&self, key: &str) -> Option<CacheRecord> {
        match self.persistence.cache.get(key).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn persist_later(&self, descriptor: VehicleDescriptor, resolved: ResolvedImage) {
        let persistence = self.persistence.clone();
        let span = tracing::info_span!("persist_image", key = %descriptor.normalized_key, source = %resolved.source);

        self.background.spawn(
            async move {
                if let Err(e) = persistence.persist(&descriptor, &resolved).await {
                    tracing::warn!(error = %e, "background persistence failed");
                }
            }
            .instrument(span),
        );
    }
}

#[async_trait]
impl Resolve for ResolutionService {
    async fn resolve(&self, raw_name: &str) -> Result<Resolution, Error> {
        let raw_name = raw_name.trim();
        if raw_name.is_empty() {
            return Err(Error::InvalidInput("vehicle name is required".to_string()));
        }

        let descriptor = VehicleDescriptor::from_raw(raw_name);
        if descriptor.normalized_key.is_empty() {
            return Err(Error::InvalidInput(format!("no searchable terms in {raw_name:?}")));
        }

        let key = descriptor.normalized_key.as_str();
        tracing::debug!(key, category = %descriptor.category, year = ?descriptor.year, "vehicle name normalized");

        if let Some(record) = self.cached(key).await {
            tracing::info!(key, "cache hit");
            return Ok(Resolution::Found(ResolvedVehicle::from_record(record)));
        }

        let variations = generate_search_variations(raw_name);
        tracing::debug!(key, variations = variations.len(), "cache miss, searching sources");

        let Some(resolved) = self.orchestrator.resolve(&variations).await else {
            return Ok(Resolution::NotFound(NotFound::default()));
        };

        let vehicle = ResolvedVehicle::scraped(&descriptor, &resolved);
        self.persist_later(descriptor, resolved);
        Ok(Resolution::Found(vehicle))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::resolve::orchestrator::tests::{CallLog, ScriptedSource};
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    pub(crate) struct MemoryCache {
        pub records: Mutex<Vec<CacheRecord>>,
        pub fail_get: bool,
    }

    impl MemoryCache {
        pub fn record_count(&self) -> usize {
            self.records.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CacheStore for MemoryCache {
        async fn get(&self, key: &str) -> Result<Option<CacheRecord>, Error> {
            if self.fail_get {
                return Err(Error::CacheMiss("store offline".to_string()));
            }
            Ok(self.records.lock().unwrap().iter().rev().find(|r| r.normalized_key == key).cloned())
        }

        async fn put(&self, record: &CacheRecord) -> Result<String, Error> {
            self.records.lock().unwrap().push(record.clone());
            Ok(record.id.clone())
        }
    }

    /// Blob store that waits for `gate` (when set) and can be told to fail.
    #[derive(Default)]
    pub(crate) struct FakeBlobs {
        pub gate: Option<Arc<Notify>>,
        pub fail: bool,
        pub names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStore for FakeBlobs {
        async fn put(&self, _bytes: &[u8], name: &str) -> Result<String, Error> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(Error::BlobStore("bucket unavailable".to_string()));
            }
            self.names.lock().unwrap().push(name.to_string());
            Ok(format!("https://blobs.test/vehicles/{name}"))
        }
    }

    pub(crate) struct FakeDownloader {
        pub fail: bool,
    }

    #[async_trait]
    impl ImageDownloader for FakeDownloader {
        async fn download(&self, _url: &str) -> Result<Bytes, Error> {
            if self.fail {
                return Err(Error::FetchTimeout("slow cdn".to_string()));
            }
            Ok(Bytes::from_static(b"\xff\xd8\xff\xe0jpeg"))
        }
    }

    pub(crate) fn service(
        cache: Arc<MemoryCache>, blobs: Arc<FakeBlobs>, download_fails: bool, sources: Vec<Arc<dyn ImageSource>>,
    ) -> ResolutionService {
        ResolutionService::new(cache, blobs, Arc::new(FakeDownloader { fail: download_fails }), sources)
    }

    fn expect_found(resolution: Resolution) -> ResolvedVehicle {
        match resolution {
            Resolution::Found(vehicle) => vehicle,
            other => panic!("expected a hit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cache_hit_skips_sources() {
        let calls = CallLog::default();
        let cache = Arc::new(MemoryCache::default());
        let descriptor = VehicleDescriptor::from_raw("Yamaha R3 2016");
        cache
            .put(&CacheRecord::new(&descriptor, "https://blobs.test/r3.jpg", "google", vec![]))
            .await
            .unwrap();

        let svc = service(
            Arc::clone(&cache),
            Arc::new(FakeBlobs::default()),
            false,
            vec![Arc::new(ScriptedSource::new("google", &calls).hit("yamaha r3 2016", &["https://g/r3.jpg"]))],
        );

        let vehicle = expect_found(svc.resolve("Yamaha R3 2016/2017 vermelha ABS").await.unwrap());
        assert!(vehicle.cached);
        assert_eq!(vehicle.image_url, "https://blobs.test/r3.jpg");
        assert!(vehicle.created_at.is_some());
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(svc.pending_persists(), 0);
    }

    #[tokio::test]
    async fn test_responds_before_persistence() {
        let calls = CallLog::default();
        let gate = Arc::new(Notify::new());
        let cache = Arc::new(MemoryCache::default());
        let blobs = Arc::new(FakeBlobs { gate: Some(Arc::clone(&gate)), ..Default::default() });

        let svc = service(
            Arc::clone(&cache),
            Arc::clone(&blobs),
            false,
            vec![Arc::new(ScriptedSource::new("google", &calls).hit("chevrolet onix 2019", &["https://g/onix.jpg"]))],
        );

        let resolution = tokio::time::timeout(Duration::from_secs(1), svc.resolve("Chevrolet Onix 2019 branco completo"))
            .await
            .expect("resolve waited on persistence")
            .unwrap();

        let vehicle = expect_found(resolution);
        assert!(!vehicle.cached);
        assert_eq!(vehicle.source, "google");
        assert_eq!(vehicle.normalized_name, "chevrolet onix 2019");
        assert_eq!(vehicle.vehicle_type, VehicleCategory::Car);
        assert_eq!(cache.record_count(), 0);

        gate.notify_one();
        svc.drain().await;

        let records = cache.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].image_url.starts_with("https://blobs.test/vehicles/chevrolet_onix_2019_"));
        assert_eq!(records[0].all_images, vec!["https://g/onix.jpg".to_string()]);
    }

    #[tokio::test]
    async fn test_blob_failure_still_writes_record_with_scraped_url() {
        let calls = CallLog::default();
        let cache = Arc::new(MemoryCache::default());
        let blobs = Arc::new(FakeBlobs { fail: true, ..Default::default() });

        let svc = service(
            Arc::clone(&cache),
            blobs,
            false,
            vec![Arc::new(ScriptedSource::new("pexels", &calls).hit("fiat uno", &["https://p/uno.jpg"]))],
        );

        expect_found(svc.resolve("Fiat Uno").await.unwrap());
        svc.drain().await;

        let records = cache.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_url, "https://p/uno.jpg");
        assert_eq!(records[0].source, "pexels");
    }

    #[tokio::test]
    async fn test_download_failure_still_writes_record() {
        let calls = CallLog::default();
        let cache = Arc::new(MemoryCache::default());
        let blobs = Arc::new(FakeBlobs::default());

        let svc = service(
            Arc::clone(&cache),
            Arc::clone(&blobs),
            true,
            vec![Arc::new(ScriptedSource::new("google", &calls).hit("fiat uno", &["https://g/uno.jpg"]))],
        );

        expect_found(svc.resolve("Fiat Uno").await.unwrap());
        svc.drain().await;

        assert!(blobs.names.lock().unwrap().is_empty());
        assert_eq!(cache.records.lock().unwrap()[0].image_url, "https://g/uno.jpg");
    }

    #[tokio::test]
    async fn test_cache_error_degrades_to_scraping() {
        let calls = CallLog::default();
        let cache = Arc::new(MemoryCache { fail_get: true, ..Default::default() });

        let svc = service(
            cache,
            Arc::new(FakeBlobs::default()),
            false,
            vec![Arc::new(ScriptedSource::new("google", &calls).hit("fiat uno", &["https://g/uno.jpg"]))],
        );

        let vehicle = expect_found(svc.resolve("fiat uno").await.unwrap());
        assert_eq!(vehicle.image_url, "https://g/uno.jpg");
        svc.drain().await;
    }

    #[tokio::test]
    async fn test_not_found_carries_suggestions_and_skips_persistence() {
        let calls = CallLog::default();
        let cache = Arc::new(MemoryCache::default());

        let svc = service(
            Arc::clone(&cache),
            Arc::new(FakeBlobs::default()),
            false,
            vec![Arc::new(ScriptedSource::new("google", &calls))],
        );

        match svc.resolve("Gurgel BR-800 1990").await.unwrap() {
            Resolution::NotFound(not_found) => {
                assert_eq!(not_found.error, NOT_FOUND_MESSAGE);
                assert_eq!(not_found.suggestions.len(), 3);
            }
            other => panic!("expected not found, got {other:?}"),
        }
        assert_eq!(svc.pending_persists(), 0);
        assert_eq!(cache.record_count(), 0);
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let svc = service(Arc::new(MemoryCache::default()), Arc::new(FakeBlobs::default()), false, vec![]);

        assert!(matches!(svc.resolve("   ").await, Err(Error::InvalidInput(_))));
        assert!(matches!(svc.resolve("branco flex").await, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_resolved_vehicle_body_shape() {
        let descriptor = VehicleDescriptor::from_raw("Yamaha R3 2016");
        let resolved = ResolvedImage {
            image_url: "https://g/r3.jpg".to_string(),
            all_images: vec!["https://g/r3.jpg".to_string()],
            source: "google".to_string(),
            query: "yamaha r3 2016".to_string(),
        };
        let body = serde_json::to_value(ResolvedVehicle::scraped(&descriptor, &resolved)).unwrap();

        assert_eq!(body["imageUrl"], "https://g/r3.jpg");
        assert_eq!(body["normalizedName"], "yamaha r3 2016");
        assert_eq!(body["vehicleType"], "motorcycle");
        assert_eq!(body["year"], "2016");
        assert_eq!(body["cached"], false);
        assert!(body.get("createdAt").is_none());
    }
}

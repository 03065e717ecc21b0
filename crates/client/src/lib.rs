//! Client code for vehimg.
//!
//! This crate provides the image download pipeline, the shared headless
//! browser, photo extraction heuristics, the ranked image sources and the
//! resolution pipeline that ties them to the cache.

pub mod extract;
pub mod fetch;
#[cfg(feature = "render")]
pub mod render;
pub mod resolve;
pub mod sources;

pub use extract::{ImageElement, PhotoFilter, images_from_html, select_photos};
pub use fetch::{FetchClient, FetchConfig, FetchResponse, ImageDownloader};
#[cfg(feature = "render")]
pub use render::{BrowserPool, RenderError, RenderOptions};
pub use resolve::{
    BatchItem, BatchReport, BatchRunner, FallbackOrchestrator, NotFound, Resolution, ResolutionService, Resolve,
    ResolvedVehicle,
};
pub use sources::{ImageSource, SourceResult, SourcesBuilder};

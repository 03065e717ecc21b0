//! Vehicle image resolution pipeline.
//!
//! [`ResolutionService`] answers one name: cache first, then the
//! [`FallbackOrchestrator`] over the ranked sources, then persistence in the
//! background. [`BatchRunner`] applies it to a list, one name at a time.

pub mod background;
pub mod batch;
pub mod orchestrator;
pub mod service;

pub use background::BackgroundTasks;
pub use batch::{BatchItem, BatchReport, BatchRunner};
pub use orchestrator::{FallbackOrchestrator, ResolvedImage};
pub use service::{NotFound, Resolution, ResolutionService, Resolve, ResolvedVehicle};

//! Core types and shared functionality for vehimg.
//!
//! This crate provides:
//! - Vehicle name normalization and query variations
//! - Image cache implementation with SQLite backend
//! - Cache and blob store capabilities
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod name;
pub mod store;

pub use cache::{CacheDb, CacheRecord};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use name::{VehicleCategory, VehicleDescriptor};
pub use store::{BlobStore, CacheStore, FsBlobStore};

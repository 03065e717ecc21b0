//! MCP tool implementations.
//!
//! This module contains all tools exposed by the vehicle image server.

pub mod cache;
pub mod vehicle_image_batch;
pub mod vehicle_image_search;

pub use vehicle_image_batch::{VehicleImageBatchParams, batch_impl};
pub use vehicle_image_search::{VehicleImageSearchParams, search_impl};

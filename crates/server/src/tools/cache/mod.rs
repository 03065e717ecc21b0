//! Cache maintenance MCP tools.
//!
//! Direct access to the SQLite image cache: inspect the record a name
//! resolves to, and purge old records.

pub mod get;
pub mod purge;

pub use get::{CacheGetParams, get_impl};
pub use purge::{CachePurgeParams, purge_impl};

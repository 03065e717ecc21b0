//! SQLite-backed cache of resolved vehicle images.
//!
//! This module provides the persistent document store behind the image
//! pipeline, using SQLite with async access via tokio-rusqlite. It supports:
//!
//! - Exact-key lookup of the most recent record
//! - Append-only writes (duplicate keys are allowed)
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Age and count based purging

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod records;

pub use crate::Error;

pub use connection::CacheDb;
pub use records::CacheRecord;

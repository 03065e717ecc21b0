//! Storage capabilities used by the resolution pipeline.
//!
//! [`CacheStore`] is the document store keyed by normalized vehicle name and
//! [`BlobStore`] holds image bytes. The pipeline only talks to these traits,
//! so the SQLite cache and the filesystem blob store can be swapped for
//! hosted services.

mod blob;

pub use blob::{FsBlobStore, blob_file_name};

use crate::Error;
use crate::cache::{CacheDb, CacheRecord};
use async_trait::async_trait;

/// Document store of resolved images keyed by exact normalized name.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Most recent record for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<CacheRecord>, Error>;

    /// Append a record and return its id.
    async fn put(&self, record: &CacheRecord) -> Result<String, Error>;
}

/// Object store for image bytes.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name` and return a public URL for them.
    async fn put(&self, bytes: &[u8], name: &str) -> Result<String, Error>;
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<CacheRecord>, Error> {
        self.latest_record(key).await
    }

    async fn put(&self, record: &CacheRecord) -> Result<String, Error> {
        self.insert_record(record).await
    }
}

//! Filesystem-backed blob store.

use super::BlobStore;
use crate::Error;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Directory under the blob root where vehicle images are written.
const VEHICLE_PREFIX: &str = "vehicles";

/// Derive the blob file name for a normalized key.
///
/// Whitespace becomes `_` and a millisecond timestamp keeps repeated
/// uploads of the same key apart.
pub fn blob_file_name(normalized_key: &str, timestamp_ms: i64) -> String {
    let stem = normalized_key.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{stem}_{timestamp_ms}.jpg")
}

/// Writes images to `<root>/vehicles/<name>` and serves them from
/// `<public_base_url>/vehicles/<name>`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { root: root.into(), public_base_url }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(Error::BlobStore(format!("invalid blob name: {name:?}")));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8], name: &str) -> Result<String, Error> {
        validate_name(name)?;

        let dir = self.root.join(VEHICLE_PREFIX);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::BlobStore(format!("failed to create {}: {e}", dir.display())))?;

        let path = dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| Error::BlobStore(format!("failed to write {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored image blob");

        Ok(format!("{}/{VEHICLE_PREFIX}/{name}", self.public_base_url))
    }
}

//! Record identifier generation.

use sha2::{Digest, Sha256};

/// Compute the identifier of a cache record.
///
/// Records are append-only, so the creation timestamp is part of the
/// identity; two writes for the same key and image yield distinct ids.
pub fn compute_record_id(normalized_key: &str, image_url: &str, created_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized_key.as_bytes());
    hasher.update(b"\n");
    hasher.update(image_url.as_bytes());
    hasher.update(b"\n");
    hasher.update(created_at.as_bytes());
    hex::encode(hasher.finalize())
}

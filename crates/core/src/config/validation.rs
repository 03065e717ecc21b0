//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

const MIN_TIMEOUT_MS: u64 = 100;
const MAX_TIMEOUT_MS: u64 = 300_000;

fn check_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < MIN_TIMEOUT_MS {
        return Err(ConfigError::Invalid { field: field.into(), reason: "must be at least 100ms".into() });
    }
    if value > MAX_TIMEOUT_MS {
        return Err(ConfigError::Invalid {
            field: field.into(),
            reason: "must not exceed 5 minutes (300000ms)".into(),
        });
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_image_bytes` is 0 or exceeds 50MB
    /// - any timeout is less than 100ms or exceeds 5 minutes
    /// - `user_agent` or `blob_public_base_url` is empty
    /// - `max_candidates` is outside 1..=5
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "max_image_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_image_bytes > 50 * 1024 * 1024 {
            return Err(ConfigError::Invalid { field: "max_image_bytes".into(), reason: "must not exceed 50MB".into() });
        }

        check_timeout("http_timeout_ms", self.http_timeout_ms)?;
        check_timeout("download_timeout_ms", self.download_timeout_ms)?;
        check_timeout("navigation_timeout_ms", self.navigation_timeout_ms)?;

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.blob_public_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "blob_public_base_url".into(),
                reason: "must not be empty".into(),
            });
        }

        if !(1..=5).contains(&self.max_candidates) {
            return Err(ConfigError::Invalid { field: "max_candidates".into(), reason: "must be between 1 and 5".into() });
        }

        if self.pexels_api_key().is_none() {
            tracing::warn!("pexels_api_key is not set; the stock-photo source will always miss");
        }

        Ok(())
    }
}

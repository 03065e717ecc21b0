//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (VEHIMG_*)
//! 2. TOML config file (if VEHIMG_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (VEHIMG_*)
/// 2. TOML config file (if VEHIMG_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pexels API key for the stock-photo source.
    ///
    /// Set via VEHIMG_PEXELS_API_KEY. Without it the stock-photo source
    /// always reports a miss.
    #[serde(default)]
    pub pexels_api_key: Option<String>,

    /// Path to the SQLite image cache.
    ///
    /// Set via VEHIMG_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root directory of the filesystem blob store.
    ///
    /// Set via VEHIMG_BLOB_DIR environment variable.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,

    /// Public base URL under which `blob_dir` is served.
    ///
    /// Set via VEHIMG_BLOB_PUBLIC_BASE_URL environment variable.
    #[serde(default = "default_blob_public_base_url")]
    pub blob_public_base_url: String,

    /// User-Agent string for HTTP requests and browser pages.
    ///
    /// Set via VEHIMG_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for source API calls in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Timeout for the deferred image download in milliseconds.
    #[serde(default = "default_download_timeout_ms")]
    pub download_timeout_ms: u64,

    /// Timeout for browser navigation in milliseconds.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Maximum size of a downloaded image.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    /// Whether browser-backed sources are enabled.
    ///
    /// Set via VEHIMG_RENDER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub render_enabled: bool,

    /// Explicit Chrome/Chromium binary. Autodetected when unset.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Maximum candidates a source returns (1-5).
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,

    /// Minimum rendered width for an image to count as a photo.
    #[serde(default = "default_min_image_width")]
    pub min_image_width: u32,

    /// Minimum URL length for image search engine results.
    #[serde(default = "default_min_url_length")]
    pub min_url_length: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./vehimg-cache.sqlite")
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./vehimg-blobs")
}

fn default_blob_public_base_url() -> String {
    "http://localhost:3001/static".into()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .into()
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_download_timeout_ms() -> u64 {
    15_000
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_candidates() -> usize {
    5
}

fn default_min_image_width() -> u32 {
    200
}

fn default_min_url_length() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pexels_api_key: None,
            db_path: default_db_path(),
            blob_dir: default_blob_dir(),
            blob_public_base_url: default_blob_public_base_url(),
            user_agent: default_user_agent(),
            http_timeout_ms: default_http_timeout_ms(),
            download_timeout_ms: default_download_timeout_ms(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            max_image_bytes: default_max_image_bytes(),
            render_enabled: true,
            chrome_executable: None,
            max_candidates: default_max_candidates(),
            min_image_width: default_min_image_width(),
            min_url_length: default_min_url_length(),
        }
    }
}

impl AppConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_millis(self.download_timeout_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `VEHIMG_`
    /// 2. TOML file from `VEHIMG_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("VEHIMG_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("VEHIMG_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Pexels API key, if the stock-photo source is usable.
    pub fn pexels_api_key(&self) -> Option<&str> {
        self.pexels_api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./vehimg-cache.sqlite"));
        assert_eq!(config.blob_dir, PathBuf::from("./vehimg-blobs"));
        assert_eq!(config.http_timeout_ms, 10_000);
        assert_eq!(config.download_timeout_ms, 15_000);
        assert_eq!(config.navigation_timeout_ms, 30_000);
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.min_image_width, 200);
        assert!(config.render_enabled);
        assert!(config.pexels_api_key.is_none());
    }

    #[test]
    fn test_timeout_durations() {
        let config = AppConfig::default();
        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.download_timeout(), Duration::from_secs(15));
        assert_eq!(config.navigation_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_pexels_api_key_blank_is_none() {
        let config = AppConfig { pexels_api_key: Some("  ".into()), ..Default::default() };
        assert!(config.pexels_api_key().is_none());

        let config = AppConfig { pexels_api_key: Some("key".into()), ..Default::default() };
        assert_eq!(config.pexels_api_key(), Some("key"));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("VEHIMG_MIN_IMAGE_WIDTH", "320");
            jail.set_env("VEHIMG_RENDER_ENABLED", "false");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.min_image_width, 320);
            assert!(!config.render_enabled);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("vehimg.toml", "max_candidates = 3\nblob_public_base_url = \"https://cdn.test\"")?;
            jail.set_env("VEHIMG_CONFIG_FILE", "vehimg.toml");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.max_candidates, 3);
            assert_eq!(config.blob_public_base_url, "https://cdn.test");
            Ok(())
        });
    }
}

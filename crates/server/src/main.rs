//! mcp-vehicle-images server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vehimg_client::{FetchClient, FetchConfig, ResolutionService, SourcesBuilder};
use vehimg_core::{AppConfig, CacheDb, FsBlobStore};

#[cfg(feature = "render")]
use vehimg_client::{BrowserPool, RenderOptions};

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        render = config.render_enabled && cfg!(feature = "render"),
        db_path = %config.db_path.display(),
        "Starting mcp-vehicle-images server on stdio transport"
    );

    if let Some(parent) = config.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let cache = CacheDb::open(&config.db_path).await.context("failed to open image cache")?;

    let blobs = FsBlobStore::new(&config.blob_dir, &config.blob_public_base_url);
    let downloader = FetchClient::new(FetchConfig::from_app_config(&config))?;

    let sources = SourcesBuilder::new(&config);
    #[cfg(feature = "render")]
    let browser = Arc::new(BrowserPool::new(RenderOptions::from_app_config(&config)));
    #[cfg(feature = "render")]
    let sources = sources.browser(Arc::clone(&browser));

    let service = Arc::new(ResolutionService::new(
        Arc::new(cache.clone()),
        Arc::new(blobs),
        Arc::new(downloader),
        sources.build(),
    ));
    tracing::info!(sources = ?service.orchestrator().tags(), "image sources ready");

    let handler = handler::VehicleImageServer::new(Arc::clone(&service), cache);
    let server = serve_server(handler, stdio()).await?;

    tokio::select! {
        result = server.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
        }
    }

    tracing::info!(pending = service.pending_persists(), "waiting for background persistence");
    service.drain().await;

    #[cfg(feature = "render")]
    browser.shutdown().await;

    Ok(())
}

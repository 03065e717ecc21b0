//! vehicle_image_cache_purge tool implementation.
//!
//! Purges cache records by age or count.

use crate::error::{to_json, tool_error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vehimg_core::{CacheDb, Error};

/// Parameters for the vehicle_image_cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Purge records older than this many days.
    pub older_than_days: Option<i64>,

    /// Keep only the newest N records.
    pub max_entries: Option<usize>,
}

/// Output from the vehicle_image_cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of records deleted.
    pub deleted: u64,
}

/// Implementation of the vehicle_image_cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.older_than_days.is_none() && params.max_entries.is_none() {
        return Err(tool_error(Error::InvalidInput(
            "At least one of older_than_days or max_entries must be specified".to_string(),
        )));
    }

    if params.older_than_days.is_some_and(|days| days < 0) {
        return Err(tool_error(Error::InvalidInput("older_than_days must not be negative".to_string())));
    }

    let mut deleted_total = 0u64;

    if let Some(days) = params.older_than_days {
        deleted_total += cache.purge_records_older_than(days).await.map_err(tool_error)?;
    }

    if let Some(max_entries) = params.max_entries {
        deleted_total += cache.purge_lru_records(max_entries).await.map_err(tool_error)?;
    }

    tracing::info!(deleted = deleted_total, "cache purged");

    let json = to_json(&CachePurgeOutput { deleted: deleted_total })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

//! vehicle_image_cache_get tool implementation.
//!
//! Returns the most recent cache record for a vehicle name.

use crate::error::{to_json, tool_error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vehimg_core::name::normalize;
use vehimg_core::{CacheDb, CacheRecord, Error};

/// Parameters for the vehicle_image_cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Vehicle name; normalized before lookup.
    pub name: String,
}

/// Output from the vehicle_image_cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub record: CacheRecord,
}

/// Implementation of the vehicle_image_cache_get tool.
pub async fn get_impl(cache: &CacheDb, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let key = normalize(&params.name);
    if key.is_empty() {
        return Err(tool_error(Error::InvalidInput(format!("no searchable terms in {:?}", params.name))));
    }

    let record = cache
        .latest_record(&key)
        .await
        .map_err(tool_error)?
        .ok_or_else(|| tool_error(Error::CacheMiss(key.clone())))?;

    let json = to_json(&CacheGetOutput { record })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

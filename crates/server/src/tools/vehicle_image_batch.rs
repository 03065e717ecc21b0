//! vehicle_image_batch tool implementation.
//!
//! Resolves a list of names sequentially; each item succeeds or fails on
//! its own.

use crate::error::{to_json, tool_error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vehimg_client::{BatchReport, BatchRunner, Resolve};
use vehimg_core::Error;

/// Parameters for the vehicle_image_batch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VehicleImageBatchParams {
    /// Free-text vehicle names, resolved in order.
    #[serde(default)]
    pub vehicles: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub success: bool,
    pub data: BatchReport,
}

/// Implementation of the vehicle_image_batch tool.
pub async fn batch_impl<R: Resolve + ?Sized>(
    runner: &BatchRunner<R>, params: VehicleImageBatchParams,
) -> Result<CallToolResult, McpError> {
    let vehicles = params
        .vehicles
        .ok_or_else(|| Error::InvalidInput("\"vehicles\" must be an array of names".to_string()))
        .map_err(tool_error)?;

    let report = runner.resolve_all(&vehicles).await;
    let json = to_json(&BatchOutput { success: true, data: report })?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

//! vehicle_image_search tool implementation.
//!
//! Resolves one free-text vehicle name to a photo URL.

use crate::error::{to_json, tool_error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use vehimg_client::{Resolution, Resolve, ResolvedVehicle};
use vehimg_core::Error;

/// Parameters for the vehicle_image_search tool.
///
/// Either field may carry the name; `name` wins when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VehicleImageSearchParams {
    /// Free-text vehicle description, e.g. "Yamaha R3 2016/2017 vermelha ABS".
    #[serde(default)]
    pub name: Option<String>,

    /// Alias of `name`.
    #[serde(default, rename = "vehicleName")]
    pub vehicle_name: Option<String>,
}

impl VehicleImageSearchParams {
    fn requested_name(&self) -> Option<&str> {
        [self.name.as_deref(), self.vehicle_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|n| !n.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct SearchFound {
    pub success: bool,
    pub data: ResolvedVehicle,
}

#[derive(Debug, Serialize)]
pub struct SearchNotFound {
    pub success: bool,
    pub error: String,
    pub suggestions: Vec<String>,
}

/// Implementation of the vehicle_image_search tool.
pub async fn search_impl(resolver: &dyn Resolve, params: VehicleImageSearchParams) -> Result<CallToolResult, McpError> {
    let name = params
        .requested_name()
        .ok_or_else(|| Error::InvalidInput("\"name\" or \"vehicleName\" is required".to_string()))
        .map_err(tool_error)?;

    tracing::info!(vehicle = name, "vehicle image search");

    let json = match resolver.resolve(name).await.map_err(tool_error)? {
        Resolution::Found(vehicle) => to_json(&SearchFound { success: true, data: vehicle })?,
        Resolution::NotFound(not_found) => to_json(&SearchNotFound {
            success: false,
            error: not_found.error,
            suggestions: not_found.suggestions,
        })?,
    };

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tests::{FakeResolver, body};

    #[tokio::test]
    async fn test_search_found() {
        let params = VehicleImageSearchParams { name: Some("Yamaha R3 2016".to_string()), ..Default::default() };
        let result = search_impl(&FakeResolver, params).await.unwrap();

        let value = body(&result);
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["imageUrl"], "https://img.test/yamaha_r3_2016.jpg");
        assert_eq!(value["data"]["cached"], false);
        assert_eq!(value["data"]["vehicleType"], "motorcycle");
    }

    #[tokio::test]
    async fn test_search_accepts_alias() {
        let params = VehicleImageSearchParams { name: Some("  ".to_string()), vehicle_name: Some("Fiat Uno".to_string()) };
        let result = search_impl(&FakeResolver, params).await.unwrap();
        assert_eq!(body(&result)["data"]["originalName"], "Fiat Uno");
    }

    #[tokio::test]
    async fn test_search_not_found_is_a_normal_result() {
        let params = VehicleImageSearchParams { name: Some("unknown".to_string()), ..Default::default() };
        let result = search_impl(&FakeResolver, params).await.unwrap();

        let value = body(&result);
        assert_eq!(value["success"], false);
        assert_eq!(value["suggestions"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_missing_name() {
        let err = search_impl(&FakeResolver, VehicleImageSearchParams::default()).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_search_internal_error_hides_cause() {
        let params = VehicleImageSearchParams { name: Some("db down".to_string()), ..Default::default() };
        let err = search_impl(&FakeResolver, params).await.unwrap_err();
        assert!(!err.message.contains("disk full"));
    }

    #[test]
    fn test_params_alias_deserialize() {
        let params: VehicleImageSearchParams = serde_json::from_str(r#"{"vehicleName":"Honda CG 160"}"#).unwrap();
        assert_eq!(params.requested_name(), Some("Honda CG 160"));
    }
}

//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use crate::tools::cache::{CacheGetParams, CachePurgeParams, get_impl, purge_impl};
use crate::tools::{VehicleImageBatchParams, VehicleImageSearchParams, batch_impl, search_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;
use vehimg_client::{BatchRunner, ResolutionService};
use vehimg_core::CacheDb;

/// Shared state behind every tool call.
pub struct AppState {
    pub service: Arc<ResolutionService>,
    pub batch: BatchRunner<ResolutionService>,
    pub cache: CacheDb,
}

/// The main MCP server handler for vehicle image resolution.
#[derive(Clone)]
pub struct VehicleImageServer {
    state: Arc<AppState>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl VehicleImageServer {
    /// Create a new server handler.
    pub fn new(service: Arc<ResolutionService>, cache: CacheDb) -> Self {
        let batch = BatchRunner::new(Arc::clone(&service));
        Self { state: Arc::new(AppState { service, batch, cache }), tool_router: Self::tool_router() }
    }

    /// Resolve one vehicle name to a photo.
    ///
    /// Answers from the cache when possible; otherwise searches the image
    /// sources and stores the result in the background.
    #[tool(
        description = "Find a representative photo for a free-text vehicle description (brand, model, year). Pass the description as `name` or `vehicleName`. Returns the image URL, the normalized name, vehicle type, year, source and whether the answer came from the cache; when nothing is found returns success=false with suggestions."
    )]
    async fn vehicle_image_search(
        &self, params: Parameters<VehicleImageSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        search_impl(self.state.service.as_ref(), params.0).await
    }

    #[tool(
        description = "Find photos for a list of vehicle descriptions, one at a time. Returns totals and a per-vehicle result; a failing vehicle never affects the others."
    )]
    async fn vehicle_image_batch(
        &self, params: Parameters<VehicleImageBatchParams>,
    ) -> Result<CallToolResult, McpError> {
        batch_impl(&self.state.batch, params.0).await
    }

    #[tool(description = "Return the most recent cached image record for a vehicle name. The name is normalized first.")]
    async fn vehicle_image_cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.state.cache, params.0).await
    }

    #[tool(
        description = "Purge cached image records older than a number of days and/or keep only the newest N records. Returns the number deleted."
    )]
    async fn vehicle_image_cache_purge(
        &self, params: Parameters<CachePurgeParams>,
    ) -> Result<CallToolResult, McpError> {
        purge_impl(&self.state.cache, params.0).await
    }
}

impl ServerHandler for VehicleImageServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "mcp-vehicle-images".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vehimg_client::FetchClient;
    use vehimg_client::FetchConfig;
    use vehimg_core::FsBlobStore;

    #[tokio::test]
    async fn test_router_lists_all_tools() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheDb::open_in_memory().await.unwrap();
        let service = Arc::new(ResolutionService::new(
            Arc::new(cache.clone()),
            Arc::new(FsBlobStore::new(dir.path(), "https://blobs.test")),
            Arc::new(FetchClient::new(FetchConfig::default()).unwrap()),
            vec![],
        ));

        let server = VehicleImageServer::new(service, cache);
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "vehicle_image_batch",
                "vehicle_image_cache_get",
                "vehicle_image_cache_purge",
                "vehicle_image_search"
            ]
        );
        assert_eq!(server.get_info().server_info.name, "mcp-vehicle-images");
    }
}

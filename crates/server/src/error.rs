//! Tool-boundary error mapping.
//!
//! Caller mistakes and cache misses reach the client with their message.
//! Everything else is logged here and replaced by a generic internal error so
//! store paths, hosts and driver messages never leave the process.

use rmcp::model::ErrorData as McpError;
use vehimg_core::Error;

const INTERNAL_MESSAGE: &str = "internal error while resolving vehicle image";

/// Convert a pipeline error into the error returned by a tool call.
pub fn tool_error(err: Error) -> McpError {
    match err {
        err @ (Error::InvalidInput(_) | Error::CacheMiss(_)) => err.into(),
        err => {
            tracing::error!(error = %err, "tool call failed");
            McpError::internal_error(INTERNAL_MESSAGE, None)
        }
    }
}

/// Serialize a tool body; a failure here is a bug, not a caller error.
pub fn to_json<T: serde::Serialize>(body: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(body).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize tool output");
        McpError::internal_error(INTERNAL_MESSAGE, None)
    })
}

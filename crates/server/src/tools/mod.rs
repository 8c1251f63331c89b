//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server. Each
//! tool is a free function generic over the storage and network so tests can
//! drive it with in-memory doubles.

pub mod cache;
pub mod offline_fetch;
pub mod update;
pub mod worker;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shellcache_core::Error;

/// Pretty-printed JSON tool result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

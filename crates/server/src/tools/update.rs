//! check_update tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use shellcache_client::{Network, UpdateChecker};
use shellcache_core::CacheStorage;

use super::json_result;

/// Implementation of the check_update tool.
pub async fn check_impl<S, N>(checker: &UpdateChecker<S, N>) -> Result<CallToolResult, McpError>
where
    S: CacheStorage + 'static,
    N: Network + 'static,
{
    json_result(&checker.check_once().await?)
}

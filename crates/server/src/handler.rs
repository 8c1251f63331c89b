//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, get_impl, list_impl};
use crate::tools::offline_fetch::{OfflineFetchParams, fetch_impl};
use crate::tools::update::check_impl;
use crate::tools::worker::{WorkerMessageParams, message_impl, status_impl};

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
use shellcache_client::{CacheManager, FetchClient, UpdateChecker};
use shellcache_core::CacheDb;

pub type Manager = CacheManager<CacheDb, FetchClient>;
pub type Checker = UpdateChecker<CacheDb, FetchClient>;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    manager: Arc<Manager>,
    checker: Arc<Checker>,
    max_preview_bytes: usize,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler.
    pub fn new(manager: Arc<Manager>, checker: Arc<Checker>, max_preview_bytes: usize) -> Self {
        Self { manager, checker, max_preview_bytes, tool_router: Self::tool_router() }
    }

    /// Route a request through the cache manager.
    ///
    /// Answers from the cache, the network, or the network with cache fallback,
    /// and reports which one was used.
    #[tool(
        description = "Fetch a path or URL through the offline cache. Returns status, route, source and a body preview."
    )]
    async fn offline_fetch(&self, params: Parameters<OfflineFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.manager, self.max_preview_bytes, params.0).await
    }

    #[tool(description = "Post a control message to the cache manager, e.g. {\"type\": \"SKIP_WAITING\"}.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.manager, params.0).await
    }

    #[tool(description = "Report the cache generation, lifecycle state and forced activation count.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.manager).await
    }

    #[tool(description = "List cache stores with entry counts.")]
    async fn cache_list(&self) -> Result<CallToolResult, McpError> {
        list_impl(&self.manager).await
    }

    #[tool(description = "Show the stored entry for a request in the serving cache store.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&self.manager, params.0).await
    }

    #[tool(description = "Check the origin for a newly deployed app shell bundle.")]
    async fn check_update(&self) -> Result<CallToolResult, McpError> {
        check_impl(&self.checker).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
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
    use shellcache_client::{FetchConfig, WorkerConfig};
    use std::time::Duration;

    async fn server() -> ShellCacheServer {
        let config = shellcache_core::AppConfig::default();
        let storage = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config).unwrap()).unwrap());
        let manager = Arc::new(CacheManager::new(WorkerConfig::from_app_config(&config).unwrap(), storage, network));
        let checker = Arc::new(UpdateChecker::new(Arc::clone(&manager), Duration::from_secs(300), false));
        ShellCacheServer::new(manager, checker, config.max_preview_bytes)
    }

    #[tokio::test]
    async fn test_lists_all_tools() {
        let server = server().await;
        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(
            names,
            vec!["cache_get", "cache_list", "check_update", "offline_fetch", "worker_message", "worker_status"]
        );
    }

    #[tokio::test]
    async fn test_server_info_name() {
        let server = server().await;
        assert_eq!(server.get_info().server_info.name, "shellcache");
    }
}

//! shellcache server entry point.
//!
//! Boots the offline cache manager for the configured app origin, installs
//! the current generation, and serves the MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheManager, FetchClient, FetchConfig, UpdateChecker, WorkerConfig};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        origin = %config.origin,
        cache = %config.cache_name(),
        "Starting shellcache server on stdio transport"
    );

    let storage = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(FetchClient::new(FetchConfig::from_app_config(&config)?)?);
    let manager = Arc::new(CacheManager::new(WorkerConfig::from_app_config(&config)?, storage, network));

    if let Err(err) = manager.install().await {
        tracing::error!(error = %err, "install failed; previous generation keeps serving");
    }

    let checker = Arc::new(UpdateChecker::new(
        Arc::clone(&manager),
        config.update_check_interval(),
        config.auto_skip_waiting,
    ));
    if config.update_check_enabled {
        Arc::clone(&checker).spawn();
    }

    let handler = handler::ShellCacheServer::new(manager, checker, config.max_preview_bytes);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

//! offgrid server entry point.
//!
//! Loads configuration, installs and activates the configured generation,
//! then serves MCP on stdio. Logging goes to stderr to avoid interfering
//! with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offgrid_client::{ClientSessions, FetchClient, FetchConfig, LifecycleManager, LifecycleOptions};
use offgrid_core::{AppConfig, CacheDb, Transport};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
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
    tracing::info!(version = %config.version, db = %config.db_path.display(), "Starting offgrid server on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let transport: Arc<dyn Transport> = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let options = LifecycleOptions::from_config(&config)?;
    let manager = Arc::new(LifecycleManager::new(
        options,
        Arc::new(cache.clone()),
        Arc::clone(&transport),
        ClientSessions::new(),
    ));

    match manager.on_install().await {
        Ok(_) => {
            if let Err(e) = manager.on_activate().await {
                tracing::warn!(error = %e, "activation deferred");
            }
        }
        Err(e) => tracing::warn!(error = %e, "install failed; retry with sw_install"),
    }

    let handler = handler::OffgridServer::new(manager, transport, cache, config.start_online);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}

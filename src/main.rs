//! ArangoDB MCP Server binary.

use arango_mcp_server::config::{Config, TransportMode};
use arango_mcp_server::db::ConnectionManager;
use arango_mcp_server::dispatch::Dispatcher;
use arango_mcp_server::tools::build_registry;
use arango_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the tracing subscriber.
///
/// All log output goes to stderr; with stdio transport stdout carries the
/// MCP protocol and must stay clean.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = %config.transport,
        database = %config.database,
        "Starting ArangoDB MCP Server"
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    // Registry construction is infallible at runtime unless the tool set
    // itself is broken, so treat failure as fatal
    let registry = match build_registry() {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!(error = %e, "Failed to build tool registry");
            return Err(e.into());
        }
    };
    info!(tool_count = registry.len(), "Tool registry ready");

    let connections = Arc::new(ConnectionManager::new(config.connection_config()));

    // Startup connection is best-effort; the dispatcher reconnects lazily
    // on the first tool call if the database is not up yet
    connections
        .connect_with_retry(config.connect_retries, config.connect_delay_duration())
        .await;

    let dispatcher = Arc::new(Dispatcher::new(registry, Arc::clone(&connections)));

    let result = match config.transport {
        TransportMode::Stdio => {
            let transport = StdioTransport::new(dispatcher, config.toolset_limit());
            transport.run().await
        }
        TransportMode::Http => {
            let transport = HttpTransport::new(
                dispatcher,
                config.toolset_limit(),
                config.http_host.clone(),
                config.http_port,
                config.mcp_endpoint.clone(),
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

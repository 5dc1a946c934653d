//! Course mock REST server.
//!
//! Loads the optional JSON fixture, wires the store into the router,
//! and serves until Ctrl+C.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mock_api::{config::ApiConfig, router::Router, server::Server};
use mock_store::{config::StoreConfig, Store};
use tokio::signal;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the mock server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// JSON fixture used as the backing store
    #[arg(long, env = "MOCK_DB")]
    db: Option<PathBuf>,

    /// Load the fixture but never write changes back to it
    #[arg(long, requires = "db")]
    read_only: bool,

    /// Allow cross-origin requests from any origin
    #[arg(long, env = "MOCK_CORS")]
    cors: bool,

    /// Disable per-request logging
    #[arg(short, long)]
    quiet: bool,

    /// Request body timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_bytes: usize,

    /// Retry attempts for transient write failures
    #[arg(long, default_value_t = 3)]
    persistence_max_retries: u32,

    /// Delay between write retries in milliseconds
    #[arg(long, default_value_t = 100)]
    persistence_retry_delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store_config = StoreConfig {
        db_path: args.db.clone(),
        read_only: args.read_only,
        persistence_max_retries: args.persistence_max_retries,
        persistence_retry_delay_ms: args.persistence_retry_delay_ms,
    };
    let store = match Store::open(&store_config) {
        Ok(store) => store,
        Err(mock_store::StoreError::DataCorruption(msg)) => {
            tracing::error!("Database file is not valid: {}", msg);
            tracing::error!("Fix or remove the file and restart.");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to open store"),
    };

    let api_config = Arc::new(ApiConfig {
        cors: args.cors,
        log_requests: !args.quiet,
        request_timeout_ms: args.request_timeout_ms,
        max_body_bytes: args.max_body_bytes,
    });
    let router = Router::new(Arc::new(store), api_config);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;
    let server = Server::new(addr, router);

    tracing::info!(
        port = args.port,
        host = %args.host,
        cors = args.cors,
        db = ?args.db,
        read_only = args.read_only,
        "Starting mock server"
    );
    for resource in mock_store::ResourceKind::ALL {
        tracing::info!("  http://{}/{}", addr, resource);
    }

    // Start server with graceful shutdown
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for Ctrl+C
    signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c")?;
    tracing::info!("Shutting down server...");
    server_handle.abort();

    Ok(())
}

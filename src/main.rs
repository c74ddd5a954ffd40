//! chirpy - authentication and session service for a short-message platform
//!
//! This is the main entry point for the chirpy application.

use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use chirpy::auth::AuthManager;
use chirpy::config::Config;
use chirpy::database::SqliteDatabase;
use chirpy::server::{AppState, Server};
use chirpy::telemetry::init_tracing;

/// chirpy - authentication and session service for a short-message platform
#[derive(Parser, Debug)]
#[command(name = "chirpy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "CHIRPY_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load and validate configuration
    let config = load_config(&args)?;
    config.validate()?;

    // Initialize tracing/logging
    init_tracing(&config.logging.level, &config.logging.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = %config.platform,
        "Starting chirpy"
    );

    // Initialize database
    let database = SqliteDatabase::new(&config.database.path).await?;
    let database = Arc::new(database);
    info!(path = %config.database.path, "Database initialized");

    // Initialize session manager
    let auth_config = config.auth_config();
    info!(
        access_token_ttl_secs = auth_config.access_token_ttl.num_seconds(),
        refresh_token_ttl_days = auth_config.refresh_token_ttl.num_days(),
        "Authentication configured"
    );
    let auth_manager = Arc::new(AuthManager::new(Arc::clone(&database), auth_config));

    let state = AppState::new(auth_manager);

    // Create and start the HTTP server
    let server = Server::new(config.server.clone(), state);

    info!(
        host = %config.server.host,
        port = %config.server.port,
        "Starting HTTP server"
    );

    let result = server.run(shutdown_signal()).await;
    if let Err(ref e) = result {
        error!(error = %e, "Server terminated with error");
    }

    info!("chirpy shutdown complete");

    result.map_err(Into::into)
}

/// Load configuration from file or environment
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            // Use eprintln! since tracing is not yet initialized
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}

/// Create a future that resolves when a shutdown signal is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

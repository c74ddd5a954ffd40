//! Structured logging setup for chirpy
//!
//! Installs a `tracing-subscriber` registry with a level filter and either a
//! JSON or a human-readable formatting layer.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Telemetry error types
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed, or installing failed
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

/// Output format of the fmt layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Parse a format name; anything other than "pretty"/"text" is JSON
    pub fn parse(format: &str) -> Self {
        match format.to_lowercase().as_str() {
            "pretty" | "text" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Parse a log level name, defaulting to INFO
pub fn parse_level(log_level: &str) -> Level {
    match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Initialize the tracing subscriber
pub fn init_tracing(log_level: &str, format: &str) -> Result<(), TelemetryError> {
    let filter = tracing_subscriber::filter::LevelFilter::from_level(parse_level(log_level));

    match LogFormat::parse(format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))?,
    }

    Ok(())
}

//! HTTP surface for chirpy
//!
//! The router and its handlers live in [`router`]; extractors, the error
//! response type and request logging live in [`middleware`]. [`Server`] ties
//! them to a listener.

pub mod middleware;
pub mod router;

pub use middleware::{authorization_header, logging_middleware, ApiError, AuthenticatedUser};
pub use router::{build_router, AppState, HealthResponse};

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::database::Database;

/// Listener wrapper serving the chirpy router until shutdown
pub struct Server<D: Database + 'static> {
    config: ServerConfig,
    state: AppState<D>,
}

impl<D: Database + 'static> Server<D> {
    /// Pair a listener configuration with the request state
    pub fn new(config: ServerConfig, state: AppState<D>) -> Self {
        Self { config, state }
    }

    /// Resolve `host:port` from the server section
    pub fn bind_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip = self
            .config
            .host
            .parse()
            .map_err(|_| ServerError::Config(format!("invalid host '{}'", self.config.host)))?;
        Ok(SocketAddr::new(ip, self.config.port))
    }

    /// Bind, then serve requests until `shutdown` resolves
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let addr = self.bind_addr()?;
        let app = build_router(self.state)
            .layer(axum::middleware::from_fn(logging_middleware))
            .layer(tower_http::trace::TraceLayer::new_for_http());

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(%addr, "Listening for requests");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        tracing::info!("Listener closed");
        Ok(())
    }
}

/// Failures starting or running the listener
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("cannot bind listener: {0}")]
    Bind(String),

    #[error("listener failed: {0}")]
    Serve(String),

    #[error("invalid server configuration: {0}")]
    Config(String),
}

//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chirpy::auth::{AuthConfig, AuthManager};
use chirpy::database::{Database, SqliteDatabase};
use chirpy::models::{CredentialsRequest, LoginResponse};
use chirpy::server::AppState;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_POLKA_KEY: &str = "integration-test-polka-key";

/// Create an in-memory database for testing
pub async fn create_test_database() -> Arc<SqliteDatabase> {
    Arc::new(
        SqliteDatabase::in_memory()
            .await
            .expect("Failed to create test database"),
    )
}

/// Runtime auth configuration shared by the integration suites
pub fn test_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET, TEST_POLKA_KEY)
}

/// Create a test session manager
pub fn create_test_auth_manager<D: Database>(db: Arc<D>) -> Arc<AuthManager<D>> {
    Arc::new(AuthManager::new(db, test_auth_config()))
}

/// Create a test application state
pub async fn create_test_state() -> AppState<SqliteDatabase> {
    let database = create_test_database().await;
    AppState::new(create_test_auth_manager(database))
}

/// Run a test server in the background and return the address
/// The server will be shut down when the returned shutdown sender is dropped or sent
pub async fn run_test_server(
    state: AppState<SqliteDatabase>,
) -> (std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("Failed to get local address");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let app = chirpy::server::build_router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
            .expect("Server error");
    });

    // Give the server a moment to start (100ms is sufficient for slow CI systems)
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    (addr, shutdown_tx)
}

/// Register a user over HTTP
pub async fn register(client: &reqwest::Client, addr: std::net::SocketAddr, email: &str, password: &str) {
    let response = client
        .post(format!("http://{}/api/users", addr))
        .json(&CredentialsRequest::new(email, password))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), 201, "registration of {} failed", email);
}

/// Log a user in over HTTP
pub async fn login(
    client: &reqwest::Client,
    addr: std::net::SocketAddr,
    email: &str,
    password: &str,
) -> LoginResponse {
    let response = client
        .post(format!("http://{}/api/login", addr))
        .json(&CredentialsRequest::new(email, password))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), 200, "login of {} failed", email);
    response.json().await.expect("Invalid login response")
}

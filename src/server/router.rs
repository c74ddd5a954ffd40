//! HTTP router for chirpy
//!
//! This module defines the axum router that handles all HTTP requests.
//! It provides routes for:
//! - Health checks
//! - Account registration, login and credential updates
//! - Refresh token exchange and revocation
//! - Chirp reading, posting and deletion
//! - The payment provider webhook

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::models::{
    Chirp, CreateChirpRequest, CredentialsRequest, LoginResponse, RefreshResponse, UserResponse,
};

use super::middleware::{authorization_header, ApiError, AuthenticatedUser};

/// Shared application state
pub struct AppState<D: Database> {
    /// Session manager
    pub auth_manager: Arc<AuthManager<D>>,
}

impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            auth_manager: Arc::clone(&self.auth_manager),
        }
    }
}

impl<D: Database> AppState<D> {
    /// Create application state around a session manager
    pub fn new(auth_manager: Arc<AuthManager<D>>) -> Self {
        Self { auth_manager }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Build the main application router
///
/// # Arguments
///
/// * `state` - Application state containing the session manager
///
/// # Returns
///
/// An axum Router configured with all endpoints
pub fn build_router<D: Database + 'static>(state: AppState<D>) -> Router {
    Router::new()
        .route("/api/healthz", get(health_handler))
        // Accounts and sessions
        .route(
            "/api/users",
            post(create_user_handler::<D>).put(update_user_handler::<D>),
        )
        .route("/api/login", post(login_handler::<D>))
        .route("/api/refresh", post(refresh_handler::<D>))
        .route("/api/revoke", post(revoke_handler::<D>))
        // Chirps
        .route(
            "/api/chirps",
            get(list_chirps_handler::<D>).post(create_chirp_handler::<D>),
        )
        .route(
            "/api/chirps/:chirp_id",
            get(get_chirp_handler::<D>).delete(delete_chirp_handler::<D>),
        )
        // Webhooks
        .route("/api/polka/webhooks", post(polka_webhook_handler::<D>))
        .with_state(state)
}

// =============================================================================
// Health Handler
// =============================================================================

/// Health check endpoint handler
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Account and Session Handlers
// =============================================================================

/// Register a new user
async fn create_user_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_manager
        .register(&request.email, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Replace the authenticated user's email and password
async fn update_user_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_manager
        .update_credentials(user_id, &request.email, &request.password)
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// Log in and receive an access token and a refresh token
async fn login_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Json(request): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .auth_manager
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(&session.user),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// Exchange a refresh token for a new access token
async fn refresh_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .auth_manager
        .refresh(authorization_header(&headers))
        .await?;

    Ok(Json(RefreshResponse { token }))
}

/// Revoke a refresh token
async fn revoke_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_manager
        .revoke(authorization_header(&headers))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Chirp Handlers
// =============================================================================

/// List all chirps
async fn list_chirps_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
) -> Result<Json<Vec<Chirp>>, ApiError> {
    Ok(Json(state.auth_manager.list_chirps().await?))
}

/// Fetch one chirp by id
async fn get_chirp_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>, ApiError> {
    Ok(Json(state.auth_manager.get_chirp(&chirp_id).await?))
}

/// Post a chirp as the authenticated user
async fn create_chirp_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<CreateChirpRequest>,
) -> Result<(StatusCode, Json<Chirp>), ApiError> {
    let chirp = state
        .auth_manager
        .post_chirp(user_id, &request.body)
        .await?;

    Ok((StatusCode::CREATED, Json(chirp)))
}

/// Delete a chirp owned by the authenticated user
async fn delete_chirp_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    Path(chirp_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_manager
        .delete_chirp(authorization_header(&headers), &chirp_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Webhook Handlers
// =============================================================================

/// Payment provider webhook
///
/// The body is taken raw so the API key is checked before it is parsed.
async fn polka_webhook_handler<D: Database + 'static>(
    State(state): State<AppState<D>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_manager
        .handle_webhook_payload(authorization_header(&headers), &body)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

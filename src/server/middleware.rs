//! HTTP middleware for chirpy
//!
//! This module provides:
//! - Error responses mapped from the shared error taxonomy
//! - Extractors for access-token authenticated callers
//! - Request/response logging

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, Classify, ErrorKind};

use super::router::AppState;

/// Read the `Authorization` header, treating a non-UTF-8 value as absent
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Authenticated user extracted from a `Bearer <access token>` header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl<D: Database + 'static> FromRequestParts<AppState<D>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<D>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = state
            .auth_manager
            .gate()
            .authenticate(authorization_header(&parts.headers))?;
        Ok(AuthenticatedUser(user_id))
    }
}

/// Error response for request handlers
///
/// The body carries a generic message for the error's kind; the detailed
/// reason is only logged.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E> From<E> for ApiError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InputInvalid => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller
    pub fn message(&self) -> String {
        match &self.0 {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::InvalidCredentials => self.0.to_string(),
            err => match err.kind() {
                ErrorKind::InputInvalid => "Invalid request".to_string(),
                ErrorKind::Unauthenticated => "Unauthorized".to_string(),
                ErrorKind::Forbidden => "Forbidden".to_string(),
                ErrorKind::NotFound => "Not found".to_string(),
                ErrorKind::Conflict => "Already exists".to_string(),
                ErrorKind::Internal => "Internal server error".to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %self.0, "Request rejected");
        }

        let body = serde_json::json!({
            "error": self.message()
        });
        (status, axum::Json(body)).into_response()
    }
}

/// Logging middleware function
///
/// Logs request and response details including:
/// - Method and path
/// - Status code
/// - Response time
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        path = %uri.path(),
        status = %status.as_u16(),
        duration_ms = %elapsed.as_millis(),
        "Request completed"
    );

    response
}

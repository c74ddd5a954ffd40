//! Authentication system for chirpy
//!
//! This module provides authentication and authorization functionality:
//! - Password hashing
//! - Authorization header parsing
//! - Access tokens (JWT) and refresh tokens
//! - Ownership checks for protected operations

pub mod gate;
pub mod header;
pub mod jwt;
pub mod manager;
pub mod password;
pub mod refresh;

use chrono::Duration;

pub use gate::{AuthGate, Authorized};
pub use header::{extract_api_key, extract_bearer};
pub use manager::{AuthManager, Session};
pub use password::{hash_password, verify_dummy, verify_password};
pub use refresh::{generate_refresh_token, RefreshTokenStore};

/// Default access token lifetime in seconds
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// Default refresh token lifetime in days
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Runtime authentication configuration
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub jwt_secret: String,

    /// Shared key for the payment provider webhook
    pub polka_key: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
}

impl AuthConfig {
    /// Create a configuration with the default token lifetimes
    pub fn new(jwt_secret: impl Into<String>, polka_key: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            polka_key: polka_key.into(),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_ttl: Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("polka_key", &"<redacted>")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

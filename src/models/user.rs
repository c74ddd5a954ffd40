//! User-related domain models
//!
//! This module defines the user record and the request/response bodies of the
//! account and session endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User stored in database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (unique)
    pub email: String,

    /// Hashed password (argon2id)
    pub hashed_password: String,

    /// Whether the user has the Chirpy Red membership
    pub is_chirpy_red: bool,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh ID
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            is_chirpy_red: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a user (never includes the password hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_chirpy_red: user.is_chirpy_red,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Email and password pair, used by registration, login and profile update
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,
}

impl CredentialsRequest {
    /// Create a new credentials request
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response body of a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,

    /// Access token (JWT)
    pub token: String,

    /// Refresh token (64 hex characters)
    pub refresh_token: String,
}

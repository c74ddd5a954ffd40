//! Token-related domain models
//!
//! This module defines the persisted refresh token row and the refresh
//! endpoint's response body.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refresh token stored in database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    /// Token value (64 hex characters, unique)
    pub token: String,

    /// Owning user
    pub user_id: Uuid,

    /// When the token was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,

    /// Absolute expiry
    pub expires_at: DateTime<Utc>,

    /// When the token was revoked (None = still usable)
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Create a new refresh token row
    pub fn new(token: impl Into<String>, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            token: token.into(),
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        }
    }

    /// Create a new refresh token row expiring `ttl` from now
    pub fn expiring_in(token: impl Into<String>, user_id: Uuid, ttl: Duration) -> Self {
        Self::new(token, user_id, Utc::now() + ttl)
    }

    /// Check if the token has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Check if the token is at or past its expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Response body of the refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Newly minted access token
    pub token: String,
}

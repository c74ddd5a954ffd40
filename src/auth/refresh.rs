//! Refresh token issuance, lookup and revocation
//!
//! Refresh tokens are opaque: 32 bytes from the OS random source, hex-encoded.
//! Unlike access tokens they are server-tracked, so revocation takes effect
//! on the next lookup.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{DbError, RefreshError};
use crate::models::RefreshToken;

/// Length of the random part of the token in bytes
const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new refresh token value (64 lowercase hex characters)
pub fn generate_refresh_token() -> Result<String, RefreshError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| RefreshError::RandomSource(e.to_string()))?;

    Ok(hex::encode(bytes))
}

/// Persistent refresh token store
pub struct RefreshTokenStore<D: Database> {
    db: Arc<D>,
    ttl: Duration,
}

impl<D: Database> RefreshTokenStore<D> {
    /// Create a store issuing tokens that live for `ttl`
    pub fn new(db: Arc<D>, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Generate and persist a token for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<String, RefreshError> {
        let token = generate_refresh_token()?;
        self.persist(&token, user_id, Utc::now() + self.ttl).await?;
        Ok(token)
    }

    /// Persist a token row; an existing row with the same value is never replaced
    pub async fn persist(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RefreshError> {
        let row = RefreshToken::new(token, user_id, expires_at);
        self.db.create_refresh_token(&row).await?;
        Ok(())
    }

    /// Resolve a token to its owning user
    ///
    /// A token that is both revoked and expired reports `Revoked`.
    pub async fn resolve(&self, token: &str) -> Result<Uuid, RefreshError> {
        let row = self
            .db
            .get_refresh_token(token)
            .await?
            .ok_or(RefreshError::NotFound)?;

        if row.is_revoked() {
            return Err(RefreshError::Revoked);
        }
        if row.is_expired() {
            return Err(RefreshError::Expired);
        }

        Ok(row.user_id)
    }

    /// Revoke a token; revoking twice keeps the first revocation time
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshError> {
        self.db
            .revoke_refresh_token(token, Utc::now())
            .await
            .map_err(|e| match e {
                DbError::NotFound => RefreshError::NotFound,
                other => RefreshError::Database(other),
            })
    }
}

//! Session manager
//!
//! This module provides the account and session flows on top of the
//! authorization gate: registration, login, token refresh and revocation,
//! credential updates, the membership webhook and chirp ownership.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{AppError, DbError};
use crate::models::{Chirp, User, WebhookEvent, MAX_CHIRP_LENGTH};

use super::gate::AuthGate;
use super::header::extract_bearer;
use super::jwt;
use super::password::{hash_password, verify_dummy, verify_password};
use super::AuthConfig;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Session manager
///
/// Owns the gate and the runtime auth configuration; shared across request
/// handlers behind an `Arc`.
pub struct AuthManager<D: Database> {
    db: Arc<D>,
    config: Arc<AuthConfig>,
    gate: AuthGate<D>,
}

impl<D: Database> AuthManager<D> {
    /// Create a new session manager
    pub fn new(db: Arc<D>, config: AuthConfig) -> Self {
        let config = Arc::new(config);
        let gate = AuthGate::new(Arc::clone(&db), Arc::clone(&config));
        Self { db, config, gate }
    }

    /// Authorization gate used by protected handlers
    pub fn gate(&self) -> &AuthGate<D> {
        &self.gate
    }

    /// Register a new user
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AppError> {
        validate_email(email)?;
        let hashed_password = hash_password(password)?;

        let user = User::new(email, hashed_password);
        self.db.create_user(&user).await.map_err(email_conflict)?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Log in with email and password
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = match self.db.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                verify_dummy(password);
                debug!("Login attempt for unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if verify_password(password, &user.hashed_password).is_err() {
            debug!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let access_token = jwt::issue(user.id, &self.config.jwt_secret, self.config.access_token_ttl)?;
        let refresh_token = self.gate.refresh_tokens().issue(user.id).await?;

        info!(user_id = %user.id, "User logged in");
        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh(&self, header: Option<&str>) -> Result<String, AppError> {
        let (_, user_id) = self.gate.authenticate_refresh(header).await?;
        let access_token = jwt::issue(user_id, &self.config.jwt_secret, self.config.access_token_ttl)?;

        debug!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke the presented refresh token
    ///
    /// Access tokens already minted from it stay valid until they expire.
    pub async fn revoke(&self, header: Option<&str>) -> Result<(), AppError> {
        let token = extract_bearer(header)?;
        self.gate.refresh_tokens().revoke(&token).await?;

        info!("Refresh token revoked");
        Ok(())
    }

    /// Replace the caller's email and password
    pub async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        validate_email(email)?;
        let hashed_password = hash_password(password)?;

        let user = self
            .db
            .update_user(user_id, email, &hashed_password)
            .await
            .map_err(|e| match e {
                DbError::NotFound => AppError::NotFound(format!("user {}", user_id)),
                other => email_conflict(other),
            })?;

        info!(user_id = %user.id, "User credentials updated");
        Ok(user)
    }

    /// Handle a payment provider webhook
    ///
    /// Events other than `user.upgraded` are accepted and ignored.
    pub async fn handle_webhook(
        &self,
        header: Option<&str>,
        event: &WebhookEvent,
    ) -> Result<(), AppError> {
        self.gate.verify_api_key(header)?;
        self.apply_webhook_event(event).await
    }

    /// Handle a raw webhook body; the key is checked before the body is parsed
    pub async fn handle_webhook_payload(
        &self,
        header: Option<&str>,
        body: &[u8],
    ) -> Result<(), AppError> {
        self.gate.verify_api_key(header)?;

        let event: WebhookEvent = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidInput(format!("invalid webhook body: {}", e)))?;

        self.apply_webhook_event(&event).await
    }

    async fn apply_webhook_event(&self, event: &WebhookEvent) -> Result<(), AppError> {
        if !event.is_upgrade() {
            debug!(event = %event.event, "Ignoring webhook event");
            return Ok(());
        }

        let user_id = Uuid::parse_str(&event.data.user_id).map_err(|_| {
            AppError::InvalidInput(format!("invalid user id '{}'", event.data.user_id))
        })?;

        self.db
            .upgrade_user_to_chirpy_red(user_id)
            .await
            .map_err(|e| match e {
                DbError::NotFound => AppError::NotFound(format!("user {}", user_id)),
                other => AppError::Database(other),
            })?;

        info!(user_id = %user_id, "User upgraded to Chirpy Red");
        Ok(())
    }

    /// Post a chirp owned by the authenticated user
    ///
    /// A token whose user no longer exists is rejected as unauthenticated.
    pub async fn post_chirp(&self, user_id: Uuid, body: &str) -> Result<Chirp, AppError> {
        if body.chars().count() > MAX_CHIRP_LENGTH {
            return Err(AppError::InvalidInput("Chirp is too long".to_string()));
        }

        if self.db.get_user_by_id(user_id).await?.is_none() {
            return Err(AppError::UnknownUser(user_id));
        }

        let chirp = Chirp::new(user_id, body);
        self.db.create_chirp(&chirp).await.map_err(|e| match e {
            // user deleted between the lookup and the insert
            DbError::ForeignKeyViolation(_) => AppError::UnknownUser(user_id),
            other => AppError::Database(other),
        })?;

        info!(user_id = %user_id, chirp_id = %chirp.id, "Chirp posted");
        Ok(chirp)
    }

    /// All chirps, oldest first
    pub async fn list_chirps(&self) -> Result<Vec<Chirp>, AppError> {
        Ok(self.db.list_chirps().await?)
    }

    /// Look up one chirp by its raw path id
    pub async fn get_chirp(&self, raw_chirp_id: &str) -> Result<Chirp, AppError> {
        let chirp_id = Uuid::parse_str(raw_chirp_id)
            .map_err(|_| AppError::InvalidInput(format!("invalid chirp id '{}'", raw_chirp_id)))?;

        self.db
            .get_chirp(chirp_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chirp {}", chirp_id)))
    }

    /// Delete a chirp after the full authorization check
    pub async fn delete_chirp(
        &self,
        header: Option<&str>,
        raw_chirp_id: &str,
    ) -> Result<(), AppError> {
        let authorized = self.gate.authorize_chirp_request(header, raw_chirp_id).await?;

        self.db
            .delete_chirp(authorized.resource.id)
            .await
            .map_err(|e| match e {
                DbError::NotFound => AppError::NotFound(format!("chirp {}", authorized.resource.id)),
                other => AppError::Database(other),
            })?;

        info!(
            user_id = %authorized.user_id,
            chirp_id = %authorized.resource.id,
            "Chirp deleted"
        );
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::InvalidInput("email is required".to_string()));
    }
    Ok(())
}

fn email_conflict(err: DbError) -> AppError {
    match err {
        DbError::ConstraintViolation(_) => {
            AppError::Database(DbError::ConstraintViolation("email already in use".to_string()))
        }
        other => AppError::Database(other),
    }
}

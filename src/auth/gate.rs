//! Authorization gate
//!
//! Every protected request walks the same sequence: a credential is presented,
//! verified into a user id, the target resource is looked up, and ownership is
//! checked. The first failing step decides the error; nothing is retried.

use std::sync::Arc;

use uuid::Uuid;

use crate::database::Database;
use crate::error::AppError;
use crate::models::Chirp;

use super::header::{extract_api_key, extract_bearer};
use super::jwt;
use super::refresh::RefreshTokenStore;
use super::AuthConfig;

/// A resource the authenticated user is allowed to mutate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized<T> {
    pub user_id: Uuid,
    pub resource: T,
}

/// Authentication and ownership checks for protected operations
pub struct AuthGate<D: Database> {
    db: Arc<D>,
    config: Arc<AuthConfig>,
    refresh_tokens: RefreshTokenStore<D>,
}

impl<D: Database> AuthGate<D> {
    /// Create a new gate
    pub fn new(db: Arc<D>, config: Arc<AuthConfig>) -> Self {
        let refresh_tokens = RefreshTokenStore::new(Arc::clone(&db), config.refresh_token_ttl);
        Self {
            db,
            config,
            refresh_tokens,
        }
    }

    /// Refresh token store backing this gate
    pub fn refresh_tokens(&self) -> &RefreshTokenStore<D> {
        &self.refresh_tokens
    }

    /// Authenticate a `Bearer <access token>` header
    pub fn authenticate(&self, header: Option<&str>) -> Result<Uuid, AppError> {
        let token = extract_bearer(header)?;
        let user_id = jwt::verify(&token, &self.config.jwt_secret)?;
        Ok(user_id)
    }

    /// Authenticate a `Bearer <refresh token>` header
    ///
    /// Returns the presented token along with its owner.
    pub async fn authenticate_refresh(
        &self,
        header: Option<&str>,
    ) -> Result<(String, Uuid), AppError> {
        let token = extract_bearer(header)?;
        let user_id = self.refresh_tokens.resolve(&token).await?;
        Ok((token, user_id))
    }

    /// Check an `ApiKey <key>` header against the configured key
    pub fn verify_api_key(&self, header: Option<&str>) -> Result<(), AppError> {
        let key = extract_api_key(header)?;
        if key != self.config.polka_key {
            return Err(AppError::InvalidApiKey);
        }
        Ok(())
    }

    /// Check that `user_id` owns the chirp
    ///
    /// A missing chirp is reported before ownership is considered.
    pub async fn authorize_chirp(&self, user_id: Uuid, chirp_id: Uuid) -> Result<Chirp, AppError> {
        let chirp = self
            .db
            .get_chirp(chirp_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("chirp {}", chirp_id)))?;

        if !chirp.is_owned_by(user_id) {
            return Err(AppError::Forbidden(format!(
                "chirp {} is not owned by user {}",
                chirp_id, user_id
            )));
        }

        Ok(chirp)
    }

    /// Run the full check for a request targeting a chirp by its raw path id
    pub async fn authorize_chirp_request(
        &self,
        header: Option<&str>,
        raw_chirp_id: &str,
    ) -> Result<Authorized<Chirp>, AppError> {
        let user_id = self.authenticate(header)?;

        let chirp_id = Uuid::parse_str(raw_chirp_id)
            .map_err(|_| AppError::InvalidInput(format!("invalid chirp id '{}'", raw_chirp_id)))?;

        let resource = self.authorize_chirp(user_id, chirp_id).await?;

        Ok(Authorized { user_id, resource })
    }
}

//! Access token codec
//!
//! Access tokens are HS256-signed JWTs carrying `{iss, sub, iat, exp}`. They
//! are stateless: nothing is persisted and there is no revocation list, so a
//! token stays valid until `exp` even after its refresh token is revoked.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TokenError;

/// Issuer claim written into every access token
pub const ISSUER: &str = "chirpy";

/// Registered claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign an access token for `user_id` that expires `ttl` from now
///
/// # Example
///
/// ```
/// use chirpy::auth::jwt::{issue, verify};
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = issue(user_id, "secret", chrono::Duration::hours(1)).unwrap();
/// assert_eq!(verify(&token, "secret").unwrap(), user_id);
/// ```
pub fn issue(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}

/// Verify an access token and return the user it was issued to
///
/// Checks run in order: compact-form parse, HMAC algorithm, signature,
/// expiry (`now >= exp` is expired), then subject parse.
pub fn verify(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    // expiry is checked below without leeway
    validation.validate_exp = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        JwtErrorKind::InvalidSignature | JwtErrorKind::InvalidAlgorithm => {
            TokenError::BadSignature
        }
        _ => TokenError::Malformed(e.to_string()),
    })?;

    if data.claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::InvalidSubject(data.claims.sub))
}

//! Password hashing and verification
//!
//! Passwords are hashed with Argon2id using a random salt and the library's
//! default cost parameters. The stored value is the PHC string, so the salt
//! and parameters travel with the hash.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::sync::OnceLock;

use crate::error::PasswordError;

/// Hash a password using Argon2id
///
/// # Errors
///
/// Returns `EmptyInput` for an empty password, or `HashingFailure` if the
/// primitive itself fails.
///
/// # Example
///
/// ```
/// use chirpy::auth::password::hash_password;
///
/// let hash = hash_password("hunter2").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyInput);
    }

    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashingFailure(e.to_string()))
}

/// Verify a password against a stored hash
///
/// A stored value that is not a valid PHC string is reported as `Mismatch`.
///
/// # Example
///
/// ```
/// use chirpy::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("hunter2").unwrap();
/// assert!(verify_password("hunter2", &hash).is_ok());
/// assert!(verify_password("hunter3", &hash).is_err());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::Mismatch)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::Mismatch)
}

/// Run one verification against a fixed hash and discard the result
///
/// Used when there is no stored hash to check, so a lookup miss costs the
/// same as a wrong password.
pub fn verify_dummy(password: &str) {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

    let dummy = DUMMY_HASH.get_or_init(|| hash_password("chirpy-login-placeholder").ok());
    if let Some(hash) = dummy {
        let _ = verify_password(password, hash);
    }
}

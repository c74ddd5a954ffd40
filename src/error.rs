//! Application error types for chirpy
//!
//! This module defines the error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling, and every
//! error classifies into an [`ErrorKind`] that the HTTP layer maps to a status.

use thiserror::Error;

/// Coarse error taxonomy shared by every component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied unusable input
    InputInvalid,
    /// Missing, invalid or expired credential
    Unauthenticated,
    /// Authenticated, but not allowed to act on the resource
    Forbidden,
    /// Resource or token absent
    NotFound,
    /// Collision on a unique field
    Conflict,
    /// Signing, random-source or persistence failure
    Internal,
}

/// Trait for mapping an error onto the shared taxonomy
pub trait Classify {
    /// Returns the taxonomy member this error belongs to
    fn kind(&self) -> ErrorKind;
}

/// Password hashing errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PasswordError {
    /// Empty password supplied
    #[error("Password must not be empty")]
    EmptyInput,

    /// The hashing primitive failed
    #[error("Hash failed: {0}")]
    HashingFailure(String),

    /// Password does not match the stored hash
    #[error("Password does not match")]
    Mismatch,
}

/// Authorization header parsing errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HeaderError {
    /// No authorization header, or a blank one
    #[error("Missing authorization header")]
    Missing,

    /// Header present but not in the expected shape
    #[error("Malformed authorization header: {0}")]
    Malformed(String),
}

/// Access token errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenError {
    /// Signature does not match, or the algorithm is not HMAC
    #[error("Invalid token signature")]
    BadSignature,

    /// Token is at or past its expiry
    #[error("Token expired")]
    Expired,

    /// Token could not be parsed
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Subject claim is not a user identifier
    #[error("Invalid token subject: {0}")]
    InvalidSubject(String),

    /// Signing a new token failed
    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Refresh token errors
#[derive(Debug, Error)]
pub enum RefreshError {
    /// No such refresh token
    #[error("Refresh token not found")]
    NotFound,

    /// Token present but past expiry
    #[error("Refresh token expired")]
    Expired,

    /// Token present but explicitly revoked
    #[error("Refresh token revoked")]
    Revoked,

    /// Random source failed while generating a token
    #[error("Random source failure: {0}")]
    RandomSource(String),

    /// Persistence failure
    #[error("Refresh token storage error: {0}")]
    Database(#[from] DbError),
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// The connection thread is gone
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Record not found
    #[error("Record not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Row references a parent that does not exist
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &err {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    return DbError::ForeignKeyViolation(detail);
                }
                return DbError::ConstraintViolation(detail);
            }
        }
        DbError::Sqlite(err)
    }
}

impl From<tokio_rusqlite::Error> for DbError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => DbError::from(e),
            other => DbError::Connection(other.to_string()),
        }
    }
}

/// Application-level error type
///
/// This is the error type returned by the session manager and the
/// authorization gate. It aggregates the component error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Password error
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    /// Authorization header error
    #[error("Authorization header error: {0}")]
    Header(#[from] HeaderError),

    /// Access token error
    #[error("Access token error: {0}")]
    Token(#[from] TokenError),

    /// Refresh token error
    #[error("Refresh token error: {0}")]
    Refresh(#[from] RefreshError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Unknown email or wrong password
    #[error("Incorrect email or password")]
    InvalidCredentials,

    /// Token subject has no matching user
    #[error("Unknown user: {0}")]
    UnknownUser(uuid::Uuid),

    /// API key does not match the configured key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Caller does not own the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request input rejected
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Classify for PasswordError {
    fn kind(&self) -> ErrorKind {
        match self {
            PasswordError::EmptyInput => ErrorKind::InputInvalid,
            PasswordError::HashingFailure(_) => ErrorKind::Internal,
            PasswordError::Mismatch => ErrorKind::Unauthenticated,
        }
    }
}

impl Classify for HeaderError {
    fn kind(&self) -> ErrorKind {
        // Missing and malformed headers share one outcome upstream
        ErrorKind::Unauthenticated
    }
}

impl Classify for TokenError {
    fn kind(&self) -> ErrorKind {
        match self {
            TokenError::Signing(_) => ErrorKind::Internal,
            TokenError::BadSignature
            | TokenError::Expired
            | TokenError::Malformed(_)
            | TokenError::InvalidSubject(_) => ErrorKind::Unauthenticated,
        }
    }
}

impl Classify for RefreshError {
    fn kind(&self) -> ErrorKind {
        match self {
            RefreshError::NotFound | RefreshError::Expired | RefreshError::Revoked => {
                ErrorKind::Unauthenticated
            }
            RefreshError::RandomSource(_) => ErrorKind::Internal,
            RefreshError::Database(e) => e.kind(),
        }
    }
}

impl Classify for DbError {
    fn kind(&self) -> ErrorKind {
        match self {
            DbError::NotFound => ErrorKind::NotFound,
            DbError::ConstraintViolation(_) => ErrorKind::Conflict,
            DbError::ForeignKeyViolation(_) | DbError::Sqlite(_) | DbError::Connection(_) => {
                ErrorKind::Internal
            }
        }
    }
}

impl Classify for AppError {
    fn kind(&self) -> ErrorKind {
        match self {
            AppError::Password(e) => e.kind(),
            AppError::Header(e) => e.kind(),
            AppError::Token(e) => e.kind(),
            AppError::Refresh(e) => e.kind(),
            AppError::Database(e) => e.kind(),
            AppError::InvalidCredentials | AppError::InvalidApiKey | AppError::UnknownUser(_) => {
                ErrorKind::Unauthenticated
            }
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidInput(_) => ErrorKind::InputInvalid,
            AppError::Config(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Error message formatting
    #[test]
    fn test_password_error_messages() {
        assert_eq!(
            PasswordError::EmptyInput.to_string(),
            "Password must not be empty"
        );
        assert_eq!(
            PasswordError::HashingFailure("salt".to_string()).to_string(),
            "Hash failed: salt"
        );
        assert_eq!(
            PasswordError::Mismatch.to_string(),
            "Password does not match"
        );
    }

    // Test 2: Header and token messages carry the reason
    #[test]
    fn test_header_and_token_error_messages() {
        assert_eq!(
            HeaderError::Missing.to_string(),
            "Missing authorization header"
        );
        assert_eq!(
            HeaderError::Malformed("expected 2 parts".to_string()).to_string(),
            "Malformed authorization header: expected 2 parts"
        );
        assert_eq!(TokenError::Expired.to_string(), "Token expired");
        assert_eq!(
            TokenError::InvalidSubject("abc".to_string()).to_string(),
            "Invalid token subject: abc"
        );
    }

    // Test 3: Refresh failures stay distinguishable in logs
    #[test]
    fn test_refresh_error_messages_are_distinct() {
        let messages = [
            RefreshError::NotFound.to_string(),
            RefreshError::Expired.to_string(),
            RefreshError::Revoked.to_string(),
        ];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    // Test 4: Refresh failures all collapse to unauthenticated
    #[test]
    fn test_refresh_error_kinds() {
        assert_eq!(RefreshError::NotFound.kind(), ErrorKind::Unauthenticated);
        assert_eq!(RefreshError::Expired.kind(), ErrorKind::Unauthenticated);
        assert_eq!(RefreshError::Revoked.kind(), ErrorKind::Unauthenticated);
        assert_eq!(
            RefreshError::RandomSource("os".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            RefreshError::Database(DbError::ConstraintViolation("token".to_string())).kind(),
            ErrorKind::Conflict
        );
    }

    // Test 5: From trait conversions for AppError
    #[test]
    fn test_app_error_from_token_error() {
        let app_err: AppError = TokenError::BadSignature.into();

        match app_err {
            AppError::Token(TokenError::BadSignature) => (),
            _ => panic!("Expected AppError::Token(TokenError::BadSignature)"),
        }
    }

    // Test 6: AppError kinds follow the taxonomy
    #[test]
    fn test_app_error_kinds() {
        assert_eq!(
            AppError::from(PasswordError::EmptyInput).kind(),
            ErrorKind::InputInvalid
        );
        assert_eq!(
            AppError::from(HeaderError::Malformed("x".to_string())).kind(),
            ErrorKind::Unauthenticated
        );
        assert_eq!(
            AppError::from(TokenError::Signing("key".to_string())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            AppError::InvalidCredentials.kind(),
            ErrorKind::Unauthenticated
        );
        assert_eq!(
            AppError::Forbidden("not owner".to_string()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            AppError::from(DbError::NotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::InvalidInput("bad id".to_string()).kind(),
            ErrorKind::InputInvalid
        );
    }

    // Test 7: DbError from rusqlite::Error
    #[test]
    fn test_db_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::InvalidParameterName("test".to_string());
        let db_err: DbError = sqlite_err.into();

        match db_err {
            DbError::Sqlite(_) => (),
            _ => panic!("Expected DbError::Sqlite"),
        }
        assert_eq!(
            DbError::Sqlite(rusqlite::Error::InvalidQuery).kind(),
            ErrorKind::Internal
        );
    }

    // Test 8: constraint failures are split by kind
    #[test]
    fn test_db_error_constraint_classification() {
        let unique = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: users.email".to_string()),
        );
        let db_err = DbError::from(unique);
        assert!(matches!(db_err, DbError::ConstraintViolation(_)));
        assert_eq!(db_err.kind(), ErrorKind::Conflict);

        let foreign = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            None,
        );
        let db_err = DbError::from(foreign);
        assert!(matches!(db_err, DbError::ForeignKeyViolation(_)));
        assert_eq!(db_err.kind(), ErrorKind::Internal);
    }

    // Test 9: connection-layer errors keep the same classification
    #[test]
    fn test_db_error_from_connection_error() {
        let wrapped = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY),
            None,
        ));
        assert!(matches!(
            DbError::from(wrapped),
            DbError::ConstraintViolation(_)
        ));

        let closed = DbError::from(tokio_rusqlite::Error::ConnectionClosed);
        assert!(matches!(closed, DbError::Connection(_)));
        assert_eq!(closed.kind(), ErrorKind::Internal);
    }

    // Test 10: AppError display includes source error
    #[test]
    fn test_app_error_display() {
        let app_err = AppError::Refresh(RefreshError::Revoked);
        assert_eq!(
            app_err.to_string(),
            "Refresh token error: Refresh token revoked"
        );

        let app_err = AppError::InvalidCredentials;
        assert_eq!(app_err.to_string(), "Incorrect email or password");
    }
}

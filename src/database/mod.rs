//! Database layer for chirpy
//!
//! This module defines the persistence collaborator trait and its SQLite
//! implementation.

pub mod schema;
pub mod sqlite;

pub use sqlite::SqliteDatabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Chirp, RefreshToken, User};

/// Database trait for data persistence
///
/// This trait defines all database operations needed by the auth core and
/// the request handlers. It uses `async_trait` for async methods and
/// `mockall::automock` for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Database: Send + Sync {
    // =========================================================================
    // User operations
    // =========================================================================

    /// Insert a new user
    ///
    /// Fails with `ConstraintViolation` if the email is already taken
    async fn create_user(&self, user: &User) -> Result<(), DbError>;

    /// Get a user by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;

    /// Get a user by ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, DbError>;

    /// Replace a user's email and password hash
    ///
    /// Returns the updated user, or `NotFound`
    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DbError>;

    /// Set the Chirpy Red flag on a user
    ///
    /// Returns the updated user, or `NotFound`
    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> Result<User, DbError>;

    // =========================================================================
    // Refresh token operations
    // =========================================================================

    /// Insert a refresh token row
    ///
    /// Never overwrites: a duplicate token value is a `ConstraintViolation`
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), DbError>;

    /// Get a refresh token row by its value, including revoked and expired rows
    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError>;

    /// Mark a refresh token revoked
    ///
    /// An already-revoked token keeps its original `revoked_at`. Returns
    /// `NotFound` if no row has this value.
    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), DbError>;

    // =========================================================================
    // Chirp operations
    // =========================================================================

    /// Insert a chirp
    ///
    /// Fails with `ForeignKeyViolation` if the author does not exist
    async fn create_chirp(&self, chirp: &Chirp) -> Result<(), DbError>;

    /// Get a chirp by ID
    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, DbError>;

    /// List every chirp, oldest first
    async fn list_chirps(&self) -> Result<Vec<Chirp>, DbError>;

    /// Delete a chirp by ID
    async fn delete_chirp(&self, id: Uuid) -> Result<(), DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    // Test 1: MockDatabase user lookups
    #[tokio::test]
    async fn test_mock_database_user_lookup() {
        let mut mock = MockDatabase::new();
        let user = User::new("a@example.com", "hash");
        let expected = user.clone();

        mock.expect_get_user_by_email()
            .withf(|email| email == "a@example.com")
            .returning(move |_| Ok(Some(user.clone())));

        let result = mock.get_user_by_email("a@example.com").await.unwrap();
        assert_eq!(result, Some(expected));
    }

    // Test 2: MockDatabase refresh token operations
    #[tokio::test]
    async fn test_mock_database_refresh_token_operations() {
        let mut mock = MockDatabase::new();
        let user_id = Uuid::new_v4();

        mock.expect_create_refresh_token().returning(|_| Ok(()));
        mock.expect_get_refresh_token()
            .withf(|token| token == "tok")
            .returning(move |_| Ok(Some(RefreshToken::expiring_in("tok", user_id, Duration::days(60)))));
        mock.expect_revoke_refresh_token()
            .returning(|_, _| Ok(()));

        let token = RefreshToken::expiring_in("tok", user_id, Duration::days(60));
        assert!(mock.create_refresh_token(&token).await.is_ok());

        let fetched = mock.get_refresh_token("tok").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, user_id);

        assert!(mock.revoke_refresh_token("tok", Utc::now()).await.is_ok());
    }

    // Test 3: MockDatabase error handling
    #[tokio::test]
    async fn test_mock_database_error_handling() {
        let mut mock = MockDatabase::new();

        mock.expect_delete_chirp()
            .returning(|_| Err(DbError::NotFound));

        let result = mock.delete_chirp(Uuid::new_v4()).await;
        match result {
            Err(DbError::NotFound) => (),
            _ => panic!("Expected DbError::NotFound"),
        }
    }
}

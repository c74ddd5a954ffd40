//! SQLite implementation of the Database trait
//!
//! This module provides a SQLite-based implementation of the Database trait
//! using rusqlite and tokio-rusqlite for async operations. All access goes
//! through a single connection thread, so a revoke is visible to every
//! lookup issued after it returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::schema::CREATE_SCHEMA;
use super::Database;
use crate::error::DbError;
use crate::models::{Chirp, RefreshToken, User};

const USER_COLUMNS: &str = "id, email, hashed_password, is_chirpy_red, created_at, updated_at";
const CHIRP_COLUMNS: &str = "id, body, user_id, created_at, updated_at";

/// SQLite database implementation
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    /// Create a new SQLite database connection
    ///
    /// Use `:memory:` for in-memory database or a file path for persistent storage.
    pub async fn new(path: &str) -> Result<Self, DbError> {
        let conn = Connection::open(path).await?;

        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Create a new in-memory database (useful for testing)
    pub async fn in_memory() -> Result<Self, DbError> {
        Self::new(":memory:").await
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    // =========================================================================
    // User operations
    // =========================================================================

    async fn create_user(&self, user: &User) -> Result<(), DbError> {
        let id = user.id.to_string();
        let email = user.email.clone();
        let hashed_password = user.hashed_password.clone();
        let is_chirpy_red = user.is_chirpy_red;
        let created_at = user.created_at.to_rfc3339();
        let updated_at = user.updated_at.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO users
                    (id, email, hashed_password, is_chirpy_red, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    rusqlite::params![
                        id,
                        email,
                        hashed_password,
                        is_chirpy_red,
                        created_at,
                        updated_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(DbError::from)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let email = email.to_string();

        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
                conn.query_row(&sql, [&email], user_from_row).optional()
            })
            .await
            .map_err(Into::into)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let id = id.to_string();

        self.conn
            .call(move |conn| select_user(conn, &id))
            .await
            .map_err(Into::into)
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, DbError> {
        let id = id.to_string();
        let email = email.to_string();
        let hashed_password = hashed_password.to_string();
        let now = Utc::now().to_rfc3339();

        let updated = self
            .conn
            .call(move |conn| {
                let count = conn.execute(
                    r#"
                    UPDATE users
                    SET email = ?1, hashed_password = ?2, updated_at = ?3
                    WHERE id = ?4
                    "#,
                    rusqlite::params![email, hashed_password, now, id],
                )?;
                if count == 0 {
                    return Ok(None);
                }
                select_user(conn, &id)
            })
            .await?;

        updated.ok_or(DbError::NotFound)
    }

    async fn upgrade_user_to_chirpy_red(&self, id: Uuid) -> Result<User, DbError> {
        let id = id.to_string();
        let now = Utc::now().to_rfc3339();

        let updated = self
            .conn
            .call(move |conn| {
                let count = conn.execute(
                    "UPDATE users SET is_chirpy_red = 1, updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, id],
                )?;
                if count == 0 {
                    return Ok(None);
                }
                select_user(conn, &id)
            })
            .await?;

        updated.ok_or(DbError::NotFound)
    }

    // =========================================================================
    // Refresh token operations
    // =========================================================================

    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), DbError> {
        let value = token.token.clone();
        let user_id = token.user_id.to_string();
        let created_at = token.created_at.to_rfc3339();
        let updated_at = token.updated_at.to_rfc3339();
        let expires_at = token.expires_at.to_rfc3339();
        let revoked_at = token.revoked_at.map(|dt| dt.to_rfc3339());

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO refresh_tokens
                    (token, user_id, created_at, updated_at, expires_at, revoked_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    rusqlite::params![
                        value, user_id, created_at, updated_at, expires_at, revoked_at
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(DbError::from)
    }

    async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError> {
        let token = token.to_string();

        self.conn
            .call(move |conn| {
                conn.query_row(
                    r#"
                    SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
                    FROM refresh_tokens
                    WHERE token = ?1
                    "#,
                    [&token],
                    |row| {
                        Ok(RefreshToken {
                            token: row.get(0)?,
                            user_id: uuid_column(row, 1)?,
                            created_at: datetime_column(row, 2)?,
                            updated_at: datetime_column(row, 3)?,
                            expires_at: datetime_column(row, 4)?,
                            revoked_at: optional_datetime_column(row, 5)?,
                        })
                    },
                )
                .optional()
            })
            .await
            .map_err(Into::into)
    }

    async fn revoke_refresh_token(&self, token: &str, at: DateTime<Utc>) -> Result<(), DbError> {
        let token = token.to_string();
        let at = at.to_rfc3339();

        let rows_affected = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    UPDATE refresh_tokens
                    SET revoked_at = COALESCE(revoked_at, ?1), updated_at = ?1
                    WHERE token = ?2
                    "#,
                    rusqlite::params![at, token],
                )
            })
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    // =========================================================================
    // Chirp operations
    // =========================================================================

    async fn create_chirp(&self, chirp: &Chirp) -> Result<(), DbError> {
        let id = chirp.id.to_string();
        let body = chirp.body.clone();
        let user_id = chirp.user_id.to_string();
        let created_at = chirp.created_at.to_rfc3339();
        let updated_at = chirp.updated_at.to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO chirps (id, body, user_id, created_at, updated_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    rusqlite::params![id, body, user_id, created_at, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(DbError::from)
    }

    async fn get_chirp(&self, id: Uuid) -> Result<Option<Chirp>, DbError> {
        let id = id.to_string();

        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM chirps WHERE id = ?1", CHIRP_COLUMNS);
                conn.query_row(&sql, [&id], chirp_from_row).optional()
            })
            .await
            .map_err(Into::into)
    }

    async fn list_chirps(&self) -> Result<Vec<Chirp>, DbError> {
        self.conn
            .call(|conn| {
                let sql = format!(
                    "SELECT {} FROM chirps ORDER BY created_at ASC, id ASC",
                    CHIRP_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map([], chirp_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await
            .map_err(Into::into)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), DbError> {
        let id = id.to_string();

        let rows_affected = self
            .conn
            .call(move |conn| conn.execute("DELETE FROM chirps WHERE id = ?1", [&id]))
            .await?;

        if rows_affected == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}

fn select_user(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    conn.query_row(&sql, [id], user_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        hashed_password: row.get(2)?,
        is_chirpy_red: row.get(3)?,
        created_at: datetime_column(row, 4)?,
        updated_at: datetime_column(row, 5)?,
    })
}

fn chirp_from_row(row: &Row<'_>) -> rusqlite::Result<Chirp> {
    Ok(Chirp {
        id: uuid_column(row, 0)?,
        body: row.get(1)?,
        user_id: uuid_column(row, 2)?,
        created_at: datetime_column(row, 3)?,
        updated_at: datetime_column(row, 4)?,
    })
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_datetime_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RefreshTokenStore;
    use crate::error::{Classify, ErrorKind};
    use chrono::Duration;
    use std::sync::Arc;

    async fn db_with_user(email: &str) -> (SqliteDatabase, User) {
        let db = SqliteDatabase::in_memory().await.unwrap();
        let user = User::new(email, "hash");
        db.create_user(&user).await.unwrap();
        (db, user)
    }

    // Test 1: Create in-memory database
    #[tokio::test]
    async fn test_create_in_memory_database() {
        let db = SqliteDatabase::in_memory().await;
        assert!(db.is_ok());
    }

    // Test 2: Insert and retrieve user by email and id
    #[tokio::test]
    async fn test_create_and_get_user() {
        let (db, user) = db_with_user("a@example.com").await;

        let by_email = db.get_user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.hashed_password, "hash");
        assert!(!by_email.is_chirpy_red);

        let by_id = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");
    }

    // Test 3: Unknown user lookups return None
    #[tokio::test]
    async fn test_get_unknown_user() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(db.get_user_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    // Test 4: Duplicate email is a constraint violation
    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let (db, _) = db_with_user("a@example.com").await;

        let result = db.create_user(&User::new("a@example.com", "other")).await;
        assert!(matches!(result, Err(DbError::ConstraintViolation(_))));
    }

    // Test 5: Update user replaces email and hash
    #[tokio::test]
    async fn test_update_user() {
        let (db, user) = db_with_user("a@example.com").await;

        let updated = db
            .update_user(user.id, "b@example.com", "new-hash")
            .await
            .unwrap();
        assert_eq!(updated.email, "b@example.com");
        assert_eq!(updated.hashed_password, "new-hash");
        assert!(updated.updated_at >= user.updated_at);

        assert!(db.get_user_by_email("a@example.com").await.unwrap().is_none());
    }

    // Test 6: Update non-existent user returns error
    #[tokio::test]
    async fn test_update_nonexistent_user() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        let result = db.update_user(Uuid::new_v4(), "x@example.com", "hash").await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    // Test 7: Upgrade sets the Chirpy Red flag
    #[tokio::test]
    async fn test_upgrade_user() {
        let (db, user) = db_with_user("a@example.com").await;

        let upgraded = db.upgrade_user_to_chirpy_red(user.id).await.unwrap();
        assert!(upgraded.is_chirpy_red);

        let missing = db.upgrade_user_to_chirpy_red(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    // Test 8: Refresh token create and lookup
    #[tokio::test]
    async fn test_refresh_token_operations() {
        let (db, user) = db_with_user("a@example.com").await;

        let token = RefreshToken::expiring_in("ab".repeat(32), user.id, Duration::days(60));
        db.create_refresh_token(&token).await.unwrap();

        let retrieved = db.get_refresh_token(&token.token).await.unwrap().unwrap();
        assert_eq!(retrieved.user_id, user.id);
        assert!(retrieved.revoked_at.is_none());
        assert!(!retrieved.is_expired());

        assert!(db.get_refresh_token("missing").await.unwrap().is_none());
    }

    // Test 9: Duplicate refresh token value is rejected, not overwritten
    #[tokio::test]
    async fn test_refresh_token_collision() {
        let (db, user) = db_with_user("a@example.com").await;
        let other = User::new("b@example.com", "hash");
        db.create_user(&other).await.unwrap();

        let token = RefreshToken::expiring_in("tok", user.id, Duration::days(60));
        db.create_refresh_token(&token).await.unwrap();

        let clash = RefreshToken::expiring_in("tok", other.id, Duration::days(60));
        let result = db.create_refresh_token(&clash).await;
        assert!(matches!(result, Err(DbError::ConstraintViolation(_))));

        let retrieved = db.get_refresh_token("tok").await.unwrap().unwrap();
        assert_eq!(retrieved.user_id, user.id);
    }

    // Test 10: Revoked row remains readable and keeps its first revocation time
    #[tokio::test]
    async fn test_revoke_refresh_token() {
        let (db, user) = db_with_user("a@example.com").await;

        let token = RefreshToken::expiring_in("tok", user.id, Duration::days(60));
        db.create_refresh_token(&token).await.unwrap();

        let first = Utc::now() - Duration::minutes(5);
        db.revoke_refresh_token("tok", first).await.unwrap();
        db.revoke_refresh_token("tok", Utc::now()).await.unwrap();

        let retrieved = db.get_refresh_token("tok").await.unwrap().unwrap();
        let revoked_at = retrieved.revoked_at.unwrap();
        assert_eq!(revoked_at.timestamp(), first.timestamp());
    }

    // Test 11: Revoke non-existent token returns error
    #[tokio::test]
    async fn test_revoke_nonexistent_token() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        let result = db.revoke_refresh_token("nonexistent", Utc::now()).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    // Test 12: Chirp create, get, delete
    #[tokio::test]
    async fn test_chirp_operations() {
        let (db, user) = db_with_user("a@example.com").await;

        let chirp = Chirp::new(user.id, "hello world");
        db.create_chirp(&chirp).await.unwrap();

        let retrieved = db.get_chirp(chirp.id).await.unwrap().unwrap();
        assert_eq!(retrieved.body, "hello world");
        assert_eq!(retrieved.user_id, user.id);

        db.delete_chirp(chirp.id).await.unwrap();
        assert!(db.get_chirp(chirp.id).await.unwrap().is_none());

        let result = db.delete_chirp(chirp.id).await;
        assert!(matches!(result, Err(DbError::NotFound)));
    }

    // Test 13: Chirp for an unknown user violates the foreign key
    #[tokio::test]
    async fn test_chirp_requires_existing_user() {
        let db = SqliteDatabase::in_memory().await.unwrap();

        let result = db.create_chirp(&Chirp::new(Uuid::new_v4(), "orphan")).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation(_))));
    }

    // Test 14: an unreadable revocation time fails the load instead of reading as live
    #[tokio::test]
    async fn test_unparseable_revoked_at_fails_load() {
        let (db, user) = db_with_user("a@example.com").await;

        let token = RefreshToken::expiring_in("tok", user.id, Duration::days(60));
        db.create_refresh_token(&token).await.unwrap();

        db.conn
            .call(|conn| {
                conn.execute(
                    "UPDATE refresh_tokens SET revoked_at = '2024-01-01 00:00:00' WHERE token = 'tok'",
                    [],
                )
            })
            .await
            .unwrap();

        let result = db.get_refresh_token("tok").await;
        assert!(matches!(
            result,
            Err(DbError::Sqlite(rusqlite::Error::FromSqlConversionFailure(5, _, _)))
        ));

        let store = RefreshTokenStore::new(Arc::new(db), Duration::days(60));
        let err = store.resolve("tok").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    // Test 15: chirps are listed oldest first
    #[tokio::test]
    async fn test_list_chirps() {
        let (db, user) = db_with_user("a@example.com").await;
        assert!(db.list_chirps().await.unwrap().is_empty());

        let mut first = Chirp::new(user.id, "first");
        first.created_at = Utc::now() - Duration::minutes(1);
        let second = Chirp::new(user.id, "second");
        db.create_chirp(&second).await.unwrap();
        db.create_chirp(&first).await.unwrap();

        let bodies: Vec<String> = db
            .list_chirps()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, vec!["first", "second"]);
    }
}

//! Chirp domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum chirp length in characters
pub const MAX_CHIRP_LENGTH: usize = 140;

/// Chirp stored in database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chirp {
    pub id: Uuid,
    pub body: String,

    /// Owning user
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chirp {
    /// Create a new chirp owned by `user_id`
    pub fn new(user_id: Uuid, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            body: body.into(),
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the chirp belongs to `user_id`
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Request body for posting a chirp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chirp_ownership() {
        let owner = Uuid::new_v4();
        let chirp = Chirp::new(owner, "hello");

        assert!(chirp.is_owned_by(owner));
        assert!(!chirp.is_owned_by(Uuid::new_v4()));
    }
}

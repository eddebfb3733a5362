use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

/// Database model for the users table
///
/// Not `Serialize`; responses are built from `auth::types::UserView`.
#[derive(Clone, FromRow, PartialEq)]
pub struct UserModel {
    pub id: i64,
    pub username: String,
    pub password_hash: String, // Argon2 PHC string
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    /// Builds a user row the way the database would after an insert
    pub fn new(id: i64, username: String, password_hash: String) -> Self {
        let now = Utc::now();

        Self {
            id,
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for UserModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserModel")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for the sessions table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct SessionModel {
    pub id: String,             // UUID v4 as string, carried inside the signed cookie
    pub user_id: Option<i64>,   // Set once the client has logged in or registered
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
}

impl SessionModel {
    /// Creates a new anonymous session with generated ID and timestamps
    pub fn new(expiration_days: i64) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(expiration_days);

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: None,
            created_at: now,
            expires_at,
            last_accessed: Some(now),
        }
    }

    /// Checks if the session has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Updates the last accessed timestamp
    pub fn touch(&mut self) {
        self.last_accessed = Some(Utc::now());
    }
}

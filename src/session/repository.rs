use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use super::models::SessionModel;
use crate::shared::AppError;

/// Storage for server-side sessions, keyed by the id carried in the cookie
#[async_trait]
pub trait SessionRepository {
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError>;

    /// Writes the session, replacing any stored copy with the same id.
    /// A session swept away by cleanup is recreated rather than reported missing.
    async fn save_session(&self, session: &SessionModel) -> Result<(), AppError>;

    /// Removes the session. Returns `false` if there was nothing to remove,
    /// which is not an error: the session is gone either way.
    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError>;

    /// Removes every session whose expiry is at or before `now`
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

/// In-memory sessions for development and tests; lost on restart
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, SessionModel>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SessionModel>>, AppError> {
        self.sessions.lock().map_err(|_| {
            warn!("In-memory session map lock poisoned");
            AppError::Internal
        })
    }

    /// Number of stored sessions, expired ones included
    pub fn session_count(&self) -> usize {
        self.sessions().map(|sessions| sessions.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl InMemorySessionRepository {
    pub fn with_sessions(sessions: Vec<SessionModel>) -> Self {
        let sessions = sessions
            .into_iter()
            .map(|session| (session.id.clone(), session))
            .collect();
        Self {
            sessions: Mutex::new(sessions),
        }
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions()
            .map(|sessions| sessions.contains_key(session_id))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    #[instrument(skip(self))]
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        Ok(self.sessions()?.get(session_id).cloned())
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn save_session(&self, session: &SessionModel) -> Result<(), AppError> {
        let replaced = self
            .sessions()?
            .insert(session.id.clone(), session.clone())
            .is_some();
        debug!(replaced, user_id = ?session.user_id, "Saved session in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
        Ok(self.sessions()?.remove(session_id).is_some())
    }

    #[instrument(skip(self))]
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut sessions = self.sessions()?;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}

/// Sessions in the `sessions` table
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_fault(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, operation, "Session query failed");
        AppError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    #[instrument(skip(self))]
    async fn find_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
        sqlx::query_as::<_, SessionModel>(
            "SELECT id, user_id, created_at, expires_at, last_accessed FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_fault("find_session"))
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn save_session(&self, session: &SessionModel) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, created_at, expires_at, last_accessed) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                 user_id = EXCLUDED.user_id, \
                 expires_at = EXCLUDED.expires_at, \
                 last_accessed = EXCLUDED.last_accessed",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .bind(session.last_accessed)
        .execute(&self.pool)
        .await
        .map_err(database_fault("save_session"))?;

        debug!(user_id = ?session.user_id, "Saved session in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(database_fault("delete_session"))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(database_fault("delete_expired_sessions"))?;

        Ok(result.rows_affected())
    }
}

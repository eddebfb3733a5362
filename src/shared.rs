use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthService;
use crate::config::SessionConfig;
use crate::session::repository::SessionRepository;
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub session_repository: Arc<dyn SessionRepository + Send + Sync>,
    pub session_config: SessionConfig,
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        session_repository: Arc<dyn SessionRepository + Send + Sync>,
        session_config: SessionConfig,
    ) -> Self {
        let auth_service = AuthService::new(session_config.clone());

        Self {
            user_repository,
            session_repository,
            session_config,
            auth_service,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every variant is a server fault; the detail stays in the logs
        error!(error = %self, "Request failed");

        let body = Json(json!({
            "error": "Internal server error"
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::session::models::SessionModel;
    use crate::session::repository::InMemorySessionRepository;
    use crate::user::models::UserModel;
    use crate::user::repository::{CreateUserResult, InMemoryUserRepository};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// User repository that counts calls before delegating to an in-memory store
    #[derive(Default)]
    pub struct RecordingUserRepository {
        inner: InMemoryUserRepository,
        pub find_calls: AtomicUsize,
        pub create_calls: AtomicUsize,
    }

    impl RecordingUserRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn create_count(&self) -> usize {
            self.create_calls.load(Ordering::SeqCst)
        }

        pub fn find_count(&self) -> usize {
            self.find_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserRepository for RecordingUserRepository {
        async fn find_by_id(&self, id: i64) -> Result<Option<UserModel>, AppError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<UserModel>, AppError> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_username(username).await
        }

        async fn create_user(
            &self,
            username: &str,
            password_hash: &str,
        ) -> Result<CreateUserResult, AppError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create_user(username, password_hash).await
        }
    }

    /// User repository whose every call fails like a lost database connection
    pub struct BrokenUserRepository;

    #[async_trait]
    impl UserRepository for BrokenUserRepository {
        async fn find_by_id(&self, _id: i64) -> Result<Option<UserModel>, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
        async fn find_by_username(&self, _username: &str) -> Result<Option<UserModel>, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
        async fn create_user(
            &self,
            _username: &str,
            _password_hash: &str,
        ) -> Result<CreateUserResult, AppError> {
            Err(AppError::DatabaseError("connection refused".to_string()))
        }
    }

    /// Session repository backed by memory that fails the chosen operations
    /// like an unreachable store
    #[derive(Default)]
    pub struct FaultySessionRepository {
        inner: InMemorySessionRepository,
        fail_find: bool,
        fail_delete: bool,
    }

    impl FaultySessionRepository {
        /// Stores and finds sessions but cannot delete them
        pub fn undeletable() -> Self {
            Self {
                fail_delete: true,
                ..Self::default()
            }
        }

        /// Cannot look sessions up
        pub fn unreadable() -> Self {
            Self {
                fail_find: true,
                ..Self::default()
            }
        }

        fn outage() -> AppError {
            AppError::DatabaseError("session store unavailable".to_string())
        }
    }

    #[async_trait]
    impl SessionRepository for FaultySessionRepository {
        async fn find_session(&self, session_id: &str) -> Result<Option<SessionModel>, AppError> {
            if self.fail_find {
                return Err(Self::outage());
            }
            self.inner.find_session(session_id).await
        }
        async fn save_session(&self, session: &SessionModel) -> Result<(), AppError> {
            self.inner.save_session(session).await
        }
        async fn delete_session(&self, session_id: &str) -> Result<bool, AppError> {
            if self.fail_delete {
                return Err(Self::outage());
            }
            self.inner.delete_session(session_id).await
        }
        async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
            self.inner.delete_expired_sessions(now).await
        }
    }

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        user_repository: Option<Arc<dyn UserRepository + Send + Sync>>,
        session_repository: Option<Arc<dyn SessionRepository + Send + Sync>>,
        session_config: SessionConfig,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                user_repository: None,
                session_repository: None,
                session_config: SessionConfig::default(),
            }
        }

        pub fn with_user_repository(mut self, repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
            self.user_repository = Some(repo);
            self
        }

        pub fn with_session_repository(
            mut self,
            repo: Arc<dyn SessionRepository + Send + Sync>,
        ) -> Self {
            self.session_repository = Some(repo);
            self
        }

        pub fn build(self) -> AppState {
            AppState::new(
                self.user_repository
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                self.session_repository
                    .unwrap_or_else(|| Arc::new(InMemorySessionRepository::new())),
                self.session_config,
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }
}

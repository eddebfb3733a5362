use axum::Router;
use std::sync::Arc;

use gatekeeper::{
    build_router,
    session::repository::{InMemorySessionRepository, SessionRepository},
    user::{InMemoryUserRepository, UserRepository},
    AppState, SessionConfig,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// One server with in-memory stores, shared by any number of clients
pub struct TestSetup {
    pub router: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub sessions: Arc<InMemorySessionRepository>,
}

impl TestSetup {
    pub fn new() -> Self {
        let users = Arc::new(InMemoryUserRepository::new());
        let sessions = Arc::new(InMemorySessionRepository::new());

        let user_repository: Arc<dyn UserRepository + Send + Sync> = users.clone();
        let session_repository: Arc<dyn SessionRepository + Send + Sync> = sessions.clone();
        let state = AppState::new(user_repository, session_repository, SessionConfig::default());

        Self {
            router: build_router(state),
            users,
            sessions,
        }
    }

    /// A browser-like client with its own cookie
    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
        }
    }
}

/// Holds the session cookie between requests, like a browser would
pub struct TestClient {
    pub router: Router,
    pub cookie: Option<String>,
}

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::session::{read_cookie, CookieJar, RequestSession};
use crate::shared::{AppError, AppState};
use crate::user::UserRepository;

/// Everything an auth operation may touch for one request
pub struct AuthContext {
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub session: RequestSession,
    pub cookies: CookieJar,
}

impl AuthContext {
    pub fn new(
        users: Arc<dyn UserRepository + Send + Sync>,
        session: RequestSession,
        cookies: CookieJar,
    ) -> Self {
        Self {
            users,
            session,
            cookies,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, &state.session_config.cookie_name).map(str::to_owned);
        let session = RequestSession::load(
            Arc::clone(&state.session_repository),
            state.session_config.tokens.clone(),
            token.as_deref(),
        )
        .await?;

        Ok(Self::new(
            Arc::clone(&state.user_repository),
            session,
            CookieJar::new(state.session_config.secure),
        ))
    }
}

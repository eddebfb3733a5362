use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{models::SessionModel, repository::SessionRepository, token::TokenConfig};
use crate::shared::AppError;

/// The session bound to one request
///
/// Loaded from the signed cookie, if any. A session row is only written once
/// something is stored in it, so anonymous visitors never touch the store.
pub struct RequestSession {
    repository: Arc<dyn SessionRepository + Send + Sync>,
    tokens: TokenConfig,
    current: Option<SessionModel>,
    issued_token: Option<String>,
}

impl RequestSession {
    /// A session with nothing stored and no cookie
    pub fn anonymous(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        tokens: TokenConfig,
    ) -> Self {
        Self {
            repository,
            tokens,
            current: None,
            issued_token: None,
        }
    }

    /// Resolves the cookie token into a stored session.
    ///
    /// Bad signatures, expired tokens, expired sessions and unknown ids all
    /// fall back to an anonymous session. Only a store failure is an error.
    #[instrument(skip_all)]
    pub async fn load(
        repository: Arc<dyn SessionRepository + Send + Sync>,
        tokens: TokenConfig,
        token: Option<&str>,
    ) -> Result<Self, AppError> {
        let mut session = Self::anonymous(repository, tokens);
        let Some(token) = token else {
            return Ok(session);
        };

        let claims = match session.tokens.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Ignoring invalid session cookie");
                return Ok(session);
            }
        };

        match session.repository.find_session(&claims.session_id).await? {
            Some(model) if model.is_expired() => {
                debug!(session_id = %model.id, "Session cookie refers to an expired session");
            }
            Some(model) => session.current = Some(model),
            None => {
                debug!(session_id = %claims.session_id, "Session cookie refers to an unknown session");
            }
        }

        Ok(session)
    }

    /// Id of the stored session, if one exists
    pub fn id(&self) -> Option<&str> {
        self.current.as_ref().map(|model| model.id.as_str())
    }

    pub fn user_id(&self) -> Option<i64> {
        self.current.as_ref().and_then(|model| model.user_id)
    }

    /// Stores the user id, creating the session (and a fresh token) if needed
    #[instrument(skip(self))]
    pub async fn set_user_id(&mut self, user_id: i64) -> Result<(), AppError> {
        match self.current.as_mut() {
            Some(model) => {
                model.user_id = Some(user_id);
                model.touch();
                self.repository.save_session(model).await?;
                debug!(session_id = %model.id, "Stored user id in existing session");
            }
            None => {
                let mut model = SessionModel::new(self.tokens.expiration_days);
                model.user_id = Some(user_id);
                let token = self.tokens.create_token(model.id.clone())?;
                self.repository.save_session(&model).await?;

                info!(session_id = %model.id, "Created session");
                self.issued_token = Some(token);
                self.current = Some(model);
            }
        }
        Ok(())
    }

    /// Removes the whole session from the store.
    ///
    /// A session already removed elsewhere (another logout, the cleanup task)
    /// counts as destroyed. On a store failure the session is left loaded so
    /// the caller can report it.
    #[instrument(skip(self))]
    pub async fn destroy(&mut self) -> Result<(), AppError> {
        if let Some(model) = &self.current {
            if self.repository.delete_session(&model.id).await? {
                info!(session_id = %model.id, "Destroyed session");
            } else {
                debug!(session_id = %model.id, "Session was already gone");
            }
        }
        self.current = None;
        self.issued_token = None;
        Ok(())
    }

    /// Token for a session created during this request, to be sent as a cookie
    pub fn take_issued_token(&mut self) -> Option<String> {
        self.issued_token.take()
    }
}

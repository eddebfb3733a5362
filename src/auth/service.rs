use tracing::{debug, error, info, instrument, warn};

use super::{
    context::AuthContext,
    password,
    types::{AuthResult, UsernamePasswordInput},
    validation::validate,
};
use crate::config::SessionConfig;
use crate::shared::AppError;
use crate::user::{CreateUserResult, UserModel};

pub const USERNAME_TAKEN: &str = "that username already exists";
pub const INVALID_LOGIN: &str = "invalid login, try again";

/// Registration, login and session lifecycle.
///
/// Holds configuration only; all per-request state lives in the `AuthContext`.
#[derive(Clone)]
pub struct AuthService {
    session_config: SessionConfig,
}

impl AuthService {
    pub fn new(session_config: SessionConfig) -> Self {
        Self { session_config }
    }

    /// Creates an account and logs the client into it
    #[instrument(skip(self, input, ctx), fields(username = %input.username))]
    pub async fn register(
        &self,
        input: UsernamePasswordInput,
        ctx: &mut AuthContext,
    ) -> Result<AuthResult, AppError> {
        let errors = validate(&input);
        if !errors.is_empty() {
            info!(field = %errors[0].field, "Registration rejected by validation");
            return Ok(AuthResult::Errors(errors));
        }

        let password_hash = password::hash_off_thread(input.password).await?;

        match ctx.users.create_user(&input.username, &password_hash).await? {
            CreateUserResult::Created(user) => {
                self.start_session(ctx, &user).await?;
                info!(user_id = user.id, "User registered");
                Ok(AuthResult::User(user))
            }
            CreateUserResult::UsernameTaken => {
                info!("Registration rejected, username taken");
                Ok(AuthResult::rejected("username", USERNAME_TAKEN))
            }
        }
    }

    /// Checks credentials and logs the client in
    #[instrument(skip(self, input, ctx), fields(username = %input.username))]
    pub async fn login(
        &self,
        input: UsernamePasswordInput,
        ctx: &mut AuthContext,
    ) -> Result<AuthResult, AppError> {
        let Some(user) = ctx.users.find_by_username(&input.username).await? else {
            info!("Login rejected, unknown username");
            return Ok(AuthResult::rejected("username", INVALID_LOGIN));
        };

        let valid =
            password::verify_off_thread(user.password_hash.clone(), input.password).await?;
        if !valid {
            info!(user_id = user.id, "Login rejected, wrong password");
            return Ok(AuthResult::rejected("password", INVALID_LOGIN));
        }

        self.start_session(ctx, &user).await?;
        info!(user_id = user.id, "User logged in");
        Ok(AuthResult::User(user))
    }

    /// The user this session is logged in as, if any.
    /// A session pointing at a deleted user yields `None` and is left as is.
    #[instrument(skip(self, ctx))]
    pub async fn me(&self, ctx: &AuthContext) -> Result<Option<UserModel>, AppError> {
        let Some(user_id) = ctx.session.user_id() else {
            debug!("No user in session");
            return Ok(None);
        };

        let user = ctx.users.find_by_id(user_id).await?;
        if user.is_none() {
            warn!(user_id = user_id, "Session refers to a user that no longer exists");
        }
        Ok(user)
    }

    /// Destroys the session; clears the cookie only if that succeeded
    #[instrument(skip(self, ctx))]
    pub async fn logout(&self, ctx: &mut AuthContext) -> bool {
        match ctx.session.destroy().await {
            Ok(()) => {
                ctx.cookies.clear(&self.session_config.cookie_name);
                info!("User logged out");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to destroy session");
                false
            }
        }
    }

    async fn start_session(&self, ctx: &mut AuthContext, user: &UserModel) -> Result<(), AppError> {
        ctx.session.set_user_id(user.id).await?;
        if let Some(token) = ctx.session.take_issued_token() {
            ctx.cookies.set(
                &self.session_config.cookie_name,
                token,
                self.session_config.max_age(),
            );
        }
        Ok(())
    }
}

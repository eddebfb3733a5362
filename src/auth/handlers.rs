use axum::{extract::State, http::HeaderMap, Json};
use tracing::{error, info, instrument};

use super::{
    context::AuthContext,
    types::{UserResponse, UserView, UsernamePasswordInput},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for account registration
///
/// POST /register
/// Returns `{ user }` or `{ errors }`; sets the session cookie on success
#[instrument(name = "register", skip_all)]
pub async fn register(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Json(input): Json<UsernamePasswordInput>,
) -> Result<(HeaderMap, Json<UserResponse>), AppError> {
    let result = state.auth_service.register(input, &mut ctx).await?;
    Ok((ctx.cookies.into_headers()?, Json(result.into())))
}

/// HTTP handler for login
///
/// POST /login
#[instrument(name = "login", skip_all)]
pub async fn login(
    State(state): State<AppState>,
    mut ctx: AuthContext,
    Json(input): Json<UsernamePasswordInput>,
) -> Result<(HeaderMap, Json<UserResponse>), AppError> {
    let result = state.auth_service.login(input, &mut ctx).await?;
    Ok((ctx.cookies.into_headers()?, Json(result.into())))
}

/// HTTP handler for the current user
///
/// GET /me
/// Returns the user or `null`
#[instrument(name = "me", skip_all)]
pub async fn me(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> Result<Json<Option<UserView>>, AppError> {
    let user = state.auth_service.me(&ctx).await?;
    Ok(Json(user.as_ref().map(UserView::from)))
}

/// HTTP handler for logout
///
/// POST /logout
/// Returns `true` and clears the cookie, or `false` if the session could not be
/// destroyed. A session that cannot even be loaded counts as not destroyed.
#[instrument(name = "logout", skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    ctx: Result<AuthContext, AppError>,
) -> Result<(HeaderMap, Json<bool>), AppError> {
    let mut ctx = match ctx {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = %e, "Could not load session for logout");
            return Ok((HeaderMap::new(), Json(false)));
        }
    };

    let destroyed = state.auth_service.logout(&mut ctx).await;
    info!(destroyed = destroyed, "Logout handled");
    Ok((ctx.cookies.into_headers()?, Json(destroyed)))
}

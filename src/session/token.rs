use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};

use super::types::SessionClaims;
use crate::shared::AppError;

/// Secret used when none is configured; only suitable for local development
pub const DEV_SESSION_SECRET: &str = "dev-session-secret-change-in-production";

/// Default session lifetime in days
pub const DEFAULT_EXPIRATION_DAYS: i64 = 365;

/// Signs and verifies the session id carried in the cookie
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub expiration_days: i64,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, expiration_days: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_days,
        }
    }

    /// Creates a signed token for the given session id
    #[instrument(skip(self, session_id))]
    pub fn create_token(&self, session_id: String) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = (now + Duration::days(self.expiration_days)).timestamp() as usize;

        debug!(
            expiration_days = self.expiration_days,
            exp_timestamp = exp,
            "Creating session token with expiration"
        );

        let claims = SessionClaims {
            session_id,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode session token");
            AppError::JwtError(e.to_string())
        })
    }

    /// Validates a token and returns the claims if the signature and expiry check out
    #[instrument(skip(self, token))]
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        debug!("Decoding and validating session token");

        decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| {
            debug!(
                session_id = %data.claims.session_id,
                exp = data.claims.exp,
                "Session token decoded successfully"
            );
            data.claims
        })
        .map_err(|e| {
            debug!(error = %e, "Failed to decode session token");
            AppError::JwtError(e.to_string())
        })
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(DEV_SESSION_SECRET, DEFAULT_EXPIRATION_DAYS)
    }
}

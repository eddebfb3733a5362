use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::session::{CleanupConfig, TokenConfig, DEFAULT_EXPIRATION_DAYS, DEV_SESSION_SECRET};
use crate::shared::AppError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
pub const DEFAULT_COOKIE_NAME: &str = "qid";

/// Session cookie settings shared by the extractor and the auth service
#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub tokens: TokenConfig,
    pub secure: bool,
}

impl SessionConfig {
    /// Lifetime of the cookie, matching the stored session's expiry
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.tokens.expiration_days)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            tokens: TokenConfig::default(),
            secure: false,
        }
    }
}

/// Process configuration, read from the environment
#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// In-memory repositories are used when unset
    pub database_url: Option<String>,
    pub session: SessionConfig,
    pub cleanup: CleanupConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let secret = lookup("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, using the development secret");
            DEV_SESSION_SECRET.to_string()
        });
        let expiration_days = parse_or(&lookup, "SESSION_EXPIRATION_DAYS", DEFAULT_EXPIRATION_DAYS)?;
        let cleanup_secs = parse_or(
            &lookup,
            "SESSION_CLEANUP_INTERVAL_SECS",
            CleanupConfig::default().cleanup_interval.as_secs(),
        )?;

        if expiration_days <= 0 {
            return Err(AppError::Config(
                "SESSION_EXPIRATION_DAYS must be positive".to_string(),
            ));
        }
        if cleanup_secs == 0 {
            return Err(AppError::Config(
                "SESSION_CLEANUP_INTERVAL_SECS must be positive".to_string(),
            ));
        }

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            session: SessionConfig {
                cookie_name: lookup("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string()),
                tokens: TokenConfig::new(secret, expiration_days),
                secure: parse_or(&lookup, "SESSION_COOKIE_SECURE", false)?,
            },
            cleanup: CleanupConfig {
                cleanup_interval: Duration::from_secs(cleanup_secs),
            },
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::Duration;
use tracing::{debug, warn};

use crate::shared::AppError;

/// A pending change to a client-held cookie
#[derive(Debug, Clone, PartialEq)]
pub enum CookieInstruction {
    Set {
        name: String,
        value: String,
        max_age_secs: i64,
    },
    Clear {
        name: String,
    },
}

/// Collects cookie instructions during a request and renders them as `Set-Cookie` headers
#[derive(Debug, Default)]
pub struct CookieJar {
    secure: bool,
    instructions: Vec<CookieInstruction>,
}

impl CookieJar {
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            instructions: Vec::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: String, max_age: Duration) {
        debug!(cookie = %name, "Queueing cookie");
        self.instructions.push(CookieInstruction::Set {
            name: name.to_string(),
            value,
            max_age_secs: max_age.num_seconds(),
        });
    }

    /// Tells the client to drop the named cookie
    pub fn clear(&mut self, name: &str) {
        debug!(cookie = %name, "Queueing cookie removal");
        self.instructions.push(CookieInstruction::Clear {
            name: name.to_string(),
        });
    }

    pub fn instructions(&self) -> &[CookieInstruction] {
        &self.instructions
    }

    fn render(&self, instruction: &CookieInstruction) -> String {
        let (name, value, max_age) = match instruction {
            CookieInstruction::Set {
                name,
                value,
                max_age_secs,
            } => (name.as_str(), value.as_str(), *max_age_secs),
            CookieInstruction::Clear { name } => (name.as_str(), "", 0),
        };

        let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
        if matches!(instruction, CookieInstruction::Clear { .. }) {
            cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Renders every queued instruction as a `Set-Cookie` header, in order
    pub fn into_headers(self) -> Result<HeaderMap, AppError> {
        let mut headers = HeaderMap::new();
        for instruction in &self.instructions {
            let value = HeaderValue::from_str(&self.render(instruction)).map_err(|e| {
                warn!(error = %e, "Cookie value is not a valid header");
                AppError::Internal
            })?;
            headers.append(header::SET_COOKIE, value);
        }
        Ok(headers)
    }
}

/// Reads a cookie value from the request's `Cookie` headers
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

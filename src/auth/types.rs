use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserModel;

/// Request payload for register and login
#[derive(Clone, Deserialize)]
pub struct UsernamePasswordInput {
    pub username: String,
    pub password: String,
}

impl UsernamePasswordInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A failure attributed to one input field, for form display
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Outcome of register and login
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    User(UserModel),
    /// Never empty
    Errors(Vec<FieldError>),
}

impl AuthResult {
    /// Rejection carrying a single field error
    pub fn rejected(field: &str, message: &str) -> Self {
        Self::Errors(vec![FieldError::new(field, message)])
    }

    pub fn user(&self) -> Option<&UserModel> {
        match self {
            Self::User(user) => Some(user),
            Self::Errors(_) => None,
        }
    }

    pub fn errors(&self) -> &[FieldError] {
        match self {
            Self::User(_) => &[],
            Self::Errors(errors) => errors,
        }
    }
}

/// Public view of a user; the password hash has no field here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserModel> for UserView {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Wire shape of `AuthResult`: exactly one of the two keys is present
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl From<AuthResult> for UserResponse {
    fn from(result: AuthResult) -> Self {
        match result {
            AuthResult::User(user) => Self {
                errors: None,
                user: Some(UserView::from(&user)),
            },
            AuthResult::Errors(errors) => Self {
                errors: Some(errors),
                user: None,
            },
        }
    }
}

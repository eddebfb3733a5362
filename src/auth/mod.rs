// Public API - what other modules can use
pub use context::AuthContext;
pub use handlers::{login, logout, me, register};
pub use service::{AuthService, INVALID_LOGIN, USERNAME_TAKEN};
pub use types::{AuthResult, FieldError, UserResponse, UserView, UsernamePasswordInput};
pub use validation::{validate, PASSWORD_TOO_SHORT, USERNAME_TOO_SHORT};

// Internal modules
mod context;
mod handlers;
pub mod password;
mod service;
pub mod types;
mod validation;

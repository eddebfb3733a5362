// Library crate for the gatekeeper auth server
// This file exposes the public API for integration tests

pub mod auth;
pub mod config;
pub mod router;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use auth::{AuthContext, AuthResult, AuthService, FieldError, UserResponse};
pub use config::{AppConfig, SessionConfig};
pub use router::build_router;
pub use shared::{AppError, AppState};

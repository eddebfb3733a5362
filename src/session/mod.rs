// Public API - what other modules can use
pub use cleanup_task::{start_cleanup_task, CleanupConfig};
pub use cookie::{read_cookie, CookieJar};
pub use request::RequestSession;
pub use token::{TokenConfig, DEFAULT_EXPIRATION_DAYS, DEV_SESSION_SECRET};
pub use types::SessionClaims;

// Internal modules
pub mod cleanup_task;
pub mod cookie;
pub mod models;
pub mod repository;
mod request;
mod token;
mod types;

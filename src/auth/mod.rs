//! Session-based authentication: password hashing, token generation, and
//! the session lifecycle (create, validate, renew, invalidate).

pub mod password;
pub mod session;
pub mod token;

pub use session::{SESSION_LIFETIME_SECS, SessionService};
pub use token::generate_session_token;

//! Domain service for registration, login, and user administration.

use thiserror::Error;

use crate::db::{User, UserPage};

/// Errors specific to account operations. `Validation` carries the exact
/// message shown inline by the calling form.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    NotFound,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("You cannot delete your own account")]
    SelfDeletion,

    #[error("You are not authorized to change this username")]
    NotOwner,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for AccountError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    /// Creates a new REGULAR user.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Validation`] on bad input or a taken name.
    async fn register(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Verifies credentials and returns the user.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for an unknown name or
    /// a wrong password, without distinguishing the two.
    async fn verify_login(&self, username: &str, password: &str) -> Result<User, AccountError>;

    /// Looks up a user by name; absence is a value, not an error.
    async fn get_user(&self, username: &str) -> Result<Option<User>, AccountError>;

    /// Paginated directory listing with optional substring search.
    async fn list_users(
        &self,
        page: u64,
        limit: u64,
        search: &str,
    ) -> Result<UserPage, AccountError>;

    /// Renames the actor's own account. No cooldown is enforced.
    async fn change_username(
        &self,
        actor: &User,
        old_username: &str,
        new_username: &str,
    ) -> Result<(), AccountError>;

    /// Admin-only. Self-deletion is rejected; dependent sessions and
    /// reputation entries are removed in the same transaction.
    async fn delete_user(&self, actor: &User, username: &str) -> Result<(), AccountError>;

    /// Creates an ADMIN user (CLI bootstrap path).
    async fn create_admin(&self, username: &str, password: &str) -> Result<User, AccountError>;
}

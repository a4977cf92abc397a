//! `SeaORM` implementation of the `AccountService` trait.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

use crate::auth::password;
use crate::config::SecurityConfig;
use crate::db::{DeleteOutcome, RenameOutcome, Role, Store, User, UserPage};
use crate::services::account_service::{AccountError, AccountService};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username regex"));

fn validate_username(username: &str) -> Result<(), AccountError> {
    if username.is_empty() {
        return Err(AccountError::Validation("Username is required".to_string()));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AccountError::Validation(
            "Username cannot contain spaces".to_string(),
        ));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(AccountError::Validation(
            "Username may only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.is_empty() {
        return Err(AccountError::Validation("Password is required".to_string()));
    }
    if password.chars().any(char::is_whitespace) {
        return Err(AccountError::Validation(
            "Password cannot contain spaces".to_string(),
        ));
    }

    let long_enough = password.len() >= 8;
    let alphanumeric = password.chars().all(|c| c.is_ascii_alphanumeric());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(long_enough && alphanumeric && has_lower && has_upper && has_digit) {
        return Err(AccountError::Validation(
            "Password must be at least 8 characters long and include uppercase, lowercase, and number"
                .to_string(),
        ));
    }
    Ok(())
}

pub struct SeaOrmAccountService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAccountService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    async fn insert_with_role(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AccountError> {
        validate_username(username)?;
        validate_password(password)?;

        // Hashing failure aborts the registration outright
        let password_hash = password::hash(password, Some(&self.security)).await?;

        // No prior existence check: the insert itself is the uniqueness
        // test, so two concurrent registrations cannot both pass.
        let inserted = self
            .store
            .insert_user(username, &password_hash, role)
            .await?;

        inserted.ok_or_else(|| AccountError::Validation("Username is already in use".to_string()))
    }
}

#[async_trait]
impl AccountService for SeaOrmAccountService {
    async fn register(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = self
            .insert_with_role(username.trim(), password, Role::Regular)
            .await?;
        tracing::info!(username = %user.username, "User registered");
        Ok(user)
    }

    async fn verify_login(&self, username: &str, password: &str) -> Result<User, AccountError> {
        if username.is_empty() || password.is_empty() {
            return Err(AccountError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let Some((user, password_hash)) = self.store.get_user_with_password(username).await?
        else {
            return Err(AccountError::InvalidCredentials);
        };

        let is_valid = password::verify(&password_hash, password).await?;
        if !is_valid {
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, AccountError> {
        Ok(self.store.get_user_by_username(username).await?)
    }

    async fn list_users(
        &self,
        page: u64,
        limit: u64,
        search: &str,
    ) -> Result<UserPage, AccountError> {
        Ok(self.store.list_users(page, limit, search).await?)
    }

    async fn change_username(
        &self,
        actor: &User,
        old_username: &str,
        new_username: &str,
    ) -> Result<(), AccountError> {
        if old_username.is_empty() || new_username.is_empty() {
            return Err(AccountError::Validation("Username is required".to_string()));
        }
        validate_username(new_username)?;

        match self
            .store
            .rename_user(old_username, new_username, actor.id)
            .await?
        {
            RenameOutcome::Renamed => {
                tracing::info!(from = %old_username, to = %new_username, "Username changed");
                Ok(())
            }
            // Whether the old name is unknown or owned by someone else, the
            // caller learns only that they may not rename it.
            RenameOutcome::NotFound | RenameOutcome::NotOwner => Err(AccountError::NotOwner),
            RenameOutcome::UsernameTaken => Err(AccountError::Validation(
                "Username is already taken".to_string(),
            )),
        }
    }

    async fn delete_user(&self, actor: &User, username: &str) -> Result<(), AccountError> {
        if actor.role != Role::Admin {
            return Err(AccountError::PermissionDenied);
        }
        if username.is_empty() {
            return Err(AccountError::Validation("Username is required".to_string()));
        }
        if !USERNAME_RE.is_match(username) {
            return Err(AccountError::Validation(
                "Invalid username format".to_string(),
            ));
        }

        match self.store.delete_user_cascading(username, actor.id).await? {
            DeleteOutcome::Deleted => {
                tracing::info!(username = %username, deleted_by = %actor.username, "User deleted");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AccountError::NotFound),
            DeleteOutcome::SelfDeletion => Err(AccountError::SelfDeletion),
        }
    }

    async fn create_admin(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let user = self
            .insert_with_role(username.trim(), password, Role::Admin)
            .await?;
        tracing::info!(username = %user.username, "Admin account created");
        Ok(user)
    }
}

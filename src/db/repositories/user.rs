use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entities::{prelude::*, reputation_entries, sessions, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "REGULAR")]
    Regular,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "REGULAR",
            Self::Admin => "ADMIN",
        }
    }

    /// Unknown values fall back to the unprivileged role.
    #[must_use]
    pub fn from_db(value: &str) -> Self {
        if value == "ADMIN" { Self::Admin } else { Self::Regular }
    }
}

/// User data returned from the repository (without the password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub created_at: String,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            role: Role::from_db(&model.role),
            created_at: model.created_at,
        }
    }
}

/// Listing projection: what the user directory exposes.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
}

#[derive(Debug)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total_users: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    NotFound,
    NotOwner,
    UsernameTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    SelfDeletion,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user. Uniqueness is enforced by the column constraint,
    /// not a prior existence check; `Ok(None)` means the name was taken.
    pub async fn insert(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>> {
        let active = users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.as_str().to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    Ok(None)
                } else {
                    Err(err).context("Failed to insert user")
                }
            }
        }
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    /// Variant that also returns the stored hash, for credential checks.
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = Users::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Paginated directory listing with optional substring search,
    /// ordered by id ascending. `page` is 1-based.
    pub async fn list(&self, page: u64, limit: u64, search: &str) -> Result<UserPage> {
        let mut query = Users::find().order_by_asc(users::Column::Id);

        if !search.is_empty() {
            query = query.filter(users::Column::Username.contains(search));
        }

        let paginator = query.paginate(&self.conn, limit);
        let counts = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count users")?;

        let users = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch user page")?
            .into_iter()
            .map(|u| UserSummary {
                username: u.username,
                role: Role::from_db(&u.role),
            })
            .collect();

        Ok(UserPage {
            users,
            total_users: counts.number_of_items,
            total_pages: counts.number_of_pages,
        })
    }

    pub async fn usernames_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = Users::find()
            .filter(users::Column::Id.is_in(ids.to_vec()))
            .all(&self.conn)
            .await
            .context("Failed to query usernames")?;

        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    /// Rename a user. Ownership check and update run in one transaction;
    /// the new name's uniqueness comes from the column constraint.
    pub async fn rename(
        &self,
        old_username: &str,
        new_username: &str,
        actor_id: i32,
    ) -> Result<RenameOutcome> {
        let txn = self.conn.begin().await?;

        let Some(existing) = Users::find()
            .filter(users::Column::Username.eq(old_username))
            .one(&txn)
            .await
            .context("Failed to query user for rename")?
        else {
            txn.rollback().await?;
            return Ok(RenameOutcome::NotFound);
        };

        if existing.id != actor_id {
            txn.rollback().await?;
            return Ok(RenameOutcome::NotOwner);
        }

        let mut active: users::ActiveModel = existing.into();
        active.username = Set(new_username.to_string());

        match active.update(&txn).await {
            Ok(_) => {
                txn.commit().await?;
                Ok(RenameOutcome::Renamed)
            }
            Err(err) => {
                if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    txn.rollback().await?;
                    Ok(RenameOutcome::UsernameTaken)
                } else {
                    Err(err).context("Failed to rename user")
                }
            }
        }
    }

    /// Delete a user together with their sessions and reputation entries.
    /// The self-deletion check and all removals run in one transaction.
    pub async fn delete_cascading(&self, username: &str, actor_id: i32) -> Result<DeleteOutcome> {
        let txn = self.conn.begin().await?;

        let Some(target) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&txn)
            .await
            .context("Failed to query user for deletion")?
        else {
            txn.rollback().await?;
            return Ok(DeleteOutcome::NotFound);
        };

        if target.id == actor_id {
            txn.rollback().await?;
            return Ok(DeleteOutcome::SelfDeletion);
        }

        ReputationEntries::delete_many()
            .filter(
                reputation_entries::Column::GiverId
                    .eq(target.id)
                    .or(reputation_entries::Column::ReceiverId.eq(target.id)),
            )
            .exec(&txn)
            .await
            .context("Failed to delete reputation entries")?;

        Sessions::delete_many()
            .filter(sessions::Column::UserId.eq(target.id))
            .exec(&txn)
            .await
            .context("Failed to delete sessions")?;

        Users::delete_by_id(target.id)
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

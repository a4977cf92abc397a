//! Domain service for forum categories. All mutations are admin-only.

use thiserror::Error;

use crate::db::{Category, User};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Validation(String),

    #[error("Category not found")]
    NotFound,

    #[error("Category is active, deactivate it first")]
    StillActive,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for CategoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

#[async_trait::async_trait]
pub trait CategoryService: Send + Sync {
    /// Active categories only; readable by anyone.
    async fn active_categories(&self) -> Result<Vec<Category>, CategoryError>;

    /// Full listing for the admin panel.
    async fn list_categories(&self, actor: &User) -> Result<Vec<Category>, CategoryError>;

    async fn create_category(
        &self,
        actor: &User,
        input: CategoryInput,
    ) -> Result<Category, CategoryError>;

    async fn update_category(
        &self,
        actor: &User,
        id: &str,
        input: CategoryInput,
    ) -> Result<(), CategoryError>;

    /// Hard delete; rejected while the category is still active.
    async fn delete_category(&self, actor: &User, id: &str) -> Result<(), CategoryError>;
}

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{categories, prelude::*};

pub use crate::entities::categories::Model as Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryDeleteOutcome {
    Deleted,
    NotFound,
    StillActive,
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list_all(&self) -> Result<Vec<Category>> {
        Categories::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list categories")
    }

    pub async fn list_active(&self) -> Result<Vec<Category>> {
        Categories::find()
            .filter(categories::Column::IsActive.eq(true))
            .order_by_asc(categories::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list active categories")
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Category>> {
        Categories::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")
    }

    pub async fn insert(&self, name: &str, description: &str, is_active: bool) -> Result<Category> {
        let active = categories::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            is_active: Set(is_active),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert category")
    }

    /// Returns false when no category with the id exists.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        description: &str,
        is_active: bool,
    ) -> Result<bool> {
        let result = Categories::update_many()
            .col_expr(
                categories::Column::Name,
                sea_orm::sea_query::Expr::value(name),
            )
            .col_expr(
                categories::Column::Description,
                sea_orm::sea_query::Expr::value(description),
            )
            .col_expr(
                categories::Column::IsActive,
                sea_orm::sea_query::Expr::value(is_active),
            )
            .filter(categories::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update category")?;

        Ok(result.rows_affected > 0)
    }

    /// Hard delete. The active check and removal run in one transaction so
    /// a concurrent reactivation cannot slip between them.
    pub async fn delete(&self, id: &str) -> Result<CategoryDeleteOutcome> {
        let txn = self.conn.begin().await?;

        let Some(category) = Categories::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query category for deletion")?
        else {
            txn.rollback().await?;
            return Ok(CategoryDeleteOutcome::NotFound);
        };

        if category.is_active {
            txn.rollback().await?;
            return Ok(CategoryDeleteOutcome::StillActive);
        }

        Categories::delete_by_id(id)
            .exec(&txn)
            .await
            .context("Failed to delete category")?;

        txn.commit().await?;
        Ok(CategoryDeleteOutcome::Deleted)
    }
}

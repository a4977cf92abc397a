//! `SeaORM` implementation of the `CategoryService` trait.

use async_trait::async_trait;

use crate::db::{Category, CategoryDeleteOutcome, Role, Store, User};
use crate::services::category_service::{CategoryError, CategoryInput, CategoryService};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 20;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 50;

fn validate_input(input: &CategoryInput) -> Result<(), CategoryError> {
    if input.name.is_empty() || input.description.is_empty() {
        return Err(CategoryError::Validation("Missing field".to_string()));
    }

    let name_len = input.name.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&name_len) {
        return Err(CategoryError::Validation(format!(
            "Category name must be between {NAME_MIN} and {NAME_MAX} characters"
        )));
    }

    let description_len = input.description.chars().count();
    if !(DESCRIPTION_MIN..=DESCRIPTION_MAX).contains(&description_len) {
        return Err(CategoryError::Validation(format!(
            "Category description must be between {DESCRIPTION_MIN} and {DESCRIPTION_MAX} characters"
        )));
    }

    Ok(())
}

/// Every admin-only operation re-checks the actor's role here, independent
/// of whatever gating the route layer applied.
fn require_admin(actor: &User) -> Result<(), CategoryError> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(CategoryError::PermissionDenied)
    }
}

pub struct SeaOrmCategoryService {
    store: Store,
}

impl SeaOrmCategoryService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CategoryService for SeaOrmCategoryService {
    async fn active_categories(&self) -> Result<Vec<Category>, CategoryError> {
        Ok(self.store.list_active_categories().await?)
    }

    async fn list_categories(&self, actor: &User) -> Result<Vec<Category>, CategoryError> {
        require_admin(actor)?;
        Ok(self.store.list_categories().await?)
    }

    async fn create_category(
        &self,
        actor: &User,
        input: CategoryInput,
    ) -> Result<Category, CategoryError> {
        require_admin(actor)?;
        validate_input(&input)?;

        let category = self
            .store
            .insert_category(&input.name, &input.description, input.is_active)
            .await?;

        tracing::info!(name = %category.name, created_by = %actor.username, "Category created");
        Ok(category)
    }

    async fn update_category(
        &self,
        actor: &User,
        id: &str,
        input: CategoryInput,
    ) -> Result<(), CategoryError> {
        require_admin(actor)?;
        validate_input(&input)?;

        let found = self
            .store
            .update_category(id, &input.name, &input.description, input.is_active)
            .await?;

        if found { Ok(()) } else { Err(CategoryError::NotFound) }
    }

    async fn delete_category(&self, actor: &User, id: &str) -> Result<(), CategoryError> {
        require_admin(actor)?;
        if id.is_empty() {
            return Err(CategoryError::Validation("Missing field".to_string()));
        }

        match self.store.delete_category(id).await? {
            CategoryDeleteOutcome::Deleted => {
                tracing::info!(id = %id, deleted_by = %actor.username, "Category deleted");
                Ok(())
            }
            CategoryDeleteOutcome::NotFound => Err(CategoryError::NotFound),
            CategoryDeleteOutcome::StillActive => Err(CategoryError::StillActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, description: &str) -> CategoryInput {
        CategoryInput {
            name: name.to_string(),
            description: description.to_string(),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_input_bounds() {
        assert!(validate_input(&input("General", "Anything goes here")).is_ok());
        assert!(validate_input(&input("", "Anything goes here")).is_err());
        assert!(validate_input(&input("G", "Anything goes here")).is_err());
        assert!(validate_input(&input(&"x".repeat(21), "Anything goes here")).is_err());
        assert!(validate_input(&input("General", "too short")).is_err());
        assert!(validate_input(&input("General", &"d".repeat(51))).is_err());
    }
}

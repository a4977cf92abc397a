use axum::{
    Json,
    extract::{Extension, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::auth::Identity;
use super::types::{ActionResponse, ApiResponse, CategoryDto, CategoryRequest};
use super::{ApiError, AppState};
use crate::db::Role;
use crate::services::{CategoryError, CategoryInput};

const NOT_LOGGED_IN: &str = "You are not logged in or your session is invalid";

fn action_error(err: &CategoryError) -> ActionResponse {
    match err {
        CategoryError::Database(cause) => {
            tracing::error!("Category action failed: {cause}");
            ActionResponse::fail("Database query error")
        }
        other => ActionResponse::fail(other.to_string()),
    }
}

impl From<CategoryRequest> for CategoryInput {
    fn from(request: CategoryRequest) -> Self {
        Self {
            name: request.name,
            description: request.description,
            is_active: request.is_active,
        }
    }
}

/// GET /api/categories
/// Active categories, readable without authentication.
pub async fn active_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state
        .categories()
        .active_categories()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        categories.into_iter().map(CategoryDto::from).collect(),
    )))
}

/// GET /api/admin/categories
/// Admin panel listing. A wrong-role viewer is sent back to their profile
/// rather than shown an error page.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Response {
    let Some(actor) = identity.0 else {
        return Redirect::to("/login").into_response();
    };

    if actor.role != Role::Admin {
        return Redirect::to("/profile").into_response();
    }

    match state.categories().list_categories(&actor).await {
        Ok(categories) => Json(ApiResponse::success(
            categories
                .into_iter()
                .map(CategoryDto::from)
                .collect::<Vec<_>>(),
        ))
        .into_response(),
        Err(CategoryError::Database(cause)) => {
            ApiError::DatabaseError(cause).into_response()
        }
        Err(err) => ApiError::internal(err.to_string()).into_response(),
    }
}

/// POST /api/admin/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CategoryRequest>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    match state
        .categories()
        .create_category(&actor, payload.into())
        .await
    {
        Ok(_) => Json(ActionResponse::ok("Category created successfully")),
        Err(err) => Json(action_error(&err)),
    }
}

/// PUT /api/admin/categories/{id}
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<CategoryRequest>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    match state
        .categories()
        .update_category(&actor, &id, payload.into())
        .await
    {
        Ok(()) => Json(ActionResponse::ok("Category updated successfully")),
        Err(err) => Json(action_error(&err)),
    }
}

/// DELETE /api/admin/categories/{id}
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    match state.categories().delete_category(&actor, &id).await {
        Ok(()) => Json(ActionResponse::ok("Category deleted successfully")),
        Err(err) => Json(action_error(&err)),
    }
}

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use std::sync::Arc;

use super::auth::Identity;
use super::types::{
    ActionResponse, ChangeUsernameRequest, ListUsersQuery, PaginationDto, UserProjectionDto,
    UsersResponse,
};
use super::validation::{validate_limit, validate_page, validate_search_query};
use super::{ApiError, AppState};
use crate::services::AccountError;

const NOT_LOGGED_IN: &str = "You are not logged in or your session is invalid";

fn action_error(err: &AccountError) -> ActionResponse {
    match err {
        AccountError::Database(cause) => {
            tracing::error!("User action failed: {cause}");
            ActionResponse::fail("Database query error")
        }
        other => ActionResponse::fail(other.to_string()),
    }
}

/// GET /api/get-user/{username}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<UserProjectionDto>, ApiError> {
    let user = state
        .accounts()
        .get_user(&username)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(Json(UserProjectionDto {
        username: user.username,
        role: user.role,
        created_at: user.created_at,
    }))
}

/// GET /api/get-users?page&limit&search
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersResponse>, ApiError> {
    let page = validate_page(query.page)?;
    let limit = validate_limit(query.limit)?;
    let search = validate_search_query(&query.search)?;

    let result = state
        .accounts()
        .list_users(page, limit, search)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(UsersResponse {
        users: result.users,
        pagination: PaginationDto {
            current_page: page,
            page_size: limit,
            total_users: result.total_users,
            total_pages: result.total_pages,
        },
    }))
}

/// POST /api/profile/change-username
pub async fn change_username(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<ChangeUsernameRequest>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    match state
        .accounts()
        .change_username(&actor, &payload.old_username, &payload.new_username)
        .await
    {
        Ok(()) => Json(ActionResponse::ok("Username updated successfully")),
        Err(err) => Json(action_error(&err)),
    }
}

/// DELETE /api/admin/users/{username}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(username): Path<String>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    match state.accounts().delete_user(&actor, &username).await {
        Ok(()) => Json(ActionResponse::ok("User deleted successfully")),
        Err(err) => Json(action_error(&err)),
    }
}

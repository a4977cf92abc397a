use axum::{
    Json,
    extract::{Extension, Path, State},
};
use std::sync::Arc;

use super::auth::Identity;
use super::types::{ActionResponse, GiveReputationRequest};
use super::{ApiError, AppState};
use crate::services::{GiveReputation, ReputationError, ReputationHistory};

const NOT_LOGGED_IN: &str = "You are not logged in or your session is invalid";

/// GET /api/profile/reputation/{username}
pub async fn reputation_history(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ReputationHistory>, ApiError> {
    let history = state
        .reputation()
        .history(&username)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?
        .ok_or_else(ApiError::user_not_found)?;

    Ok(Json(history))
}

/// POST /api/profile/reputation
pub async fn give_reputation(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<GiveReputationRequest>,
) -> Json<ActionResponse> {
    let Some(actor) = identity.0 else {
        return Json(ActionResponse::fail(NOT_LOGGED_IN));
    };

    let input = GiveReputation {
        receiver: payload.receiver,
        amount: payload.amount,
        reason: payload.reason,
        thread_id: payload.thread_id,
        comment_id: payload.comment_id,
    };

    match state.reputation().give(&actor, input).await {
        Ok(()) => Json(ActionResponse::ok("Reputation recorded successfully")),
        Err(ReputationError::Database(cause)) => {
            tracing::error!("Reputation action failed: {cause}");
            Json(ActionResponse::fail("Database query error"))
        }
        Err(err) => Json(ActionResponse::fail(err.to_string())),
    }
}

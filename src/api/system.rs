use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database: bool,
}

/// GET /api/system/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let database = state.store().ping().await.is_ok();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
    })
}

//! Domain service for the user reputation ledger.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;

#[derive(Debug, Error)]
pub enum ReputationError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for ReputationError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub struct GiveReputation {
    pub receiver: String,
    pub amount: i32,
    pub reason: String,
    pub thread_id: Option<String>,
    pub comment_id: Option<String>,
}

/// Aggregates shown at the top of a profile's reputation page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationStats {
    pub username: String,
    pub total_received: i64,
    pub total_given: i64,
    pub received_count: usize,
    pub given_count: usize,
    pub current_reputation: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedEntry {
    pub id: String,
    pub amount: i32,
    pub reason: String,
    pub created_at: String,
    pub giver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GivenEntry {
    pub id: String,
    pub amount: i32,
    pub reason: String,
    pub created_at: String,
    pub receiver: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReputationHistory {
    pub user: ReputationStats,
    pub received: Vec<ReceivedEntry>,
    pub given: Vec<GivenEntry>,
}

#[async_trait::async_trait]
pub trait ReputationService: Send + Sync {
    /// Full history for a profile, newest first, with aggregates.
    /// `Ok(None)` when no such user exists.
    async fn history(&self, username: &str) -> Result<Option<ReputationHistory>, ReputationError>;

    /// Appends a ledger entry. Entries are never mutated afterwards.
    async fn give(&self, actor: &User, input: GiveReputation) -> Result<(), ReputationError>;
}

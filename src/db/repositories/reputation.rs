use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{prelude::*, reputation_entries};

pub use crate::entities::reputation_entries::Model as ReputationEntry;

pub struct NewReputationEntry {
    pub giver_id: i32,
    pub receiver_id: i32,
    pub amount: i32,
    pub reason: String,
    pub thread_id: Option<String>,
    pub comment_id: Option<String>,
}

pub struct ReputationRepository {
    conn: DatabaseConnection,
}

impl ReputationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Entries are append-only; there is no update or delete counterpart.
    pub async fn insert(&self, entry: NewReputationEntry) -> Result<ReputationEntry> {
        let active = reputation_entries::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            giver_id: Set(entry.giver_id),
            receiver_id: Set(entry.receiver_id),
            amount: Set(entry.amount),
            reason: Set(entry.reason),
            thread_id: Set(entry.thread_id),
            comment_id: Set(entry.comment_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert reputation entry")
    }

    /// Newest first.
    pub async fn received_by(&self, user_id: i32) -> Result<Vec<ReputationEntry>> {
        ReputationEntries::find()
            .filter(reputation_entries::Column::ReceiverId.eq(user_id))
            .order_by_desc(reputation_entries::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query received reputation")
    }

    /// Newest first.
    pub async fn given_by(&self, user_id: i32) -> Result<Vec<ReputationEntry>> {
        ReputationEntries::find()
            .filter(reputation_entries::Column::GiverId.eq(user_id))
            .order_by_desc(reputation_entries::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query given reputation")
    }
}

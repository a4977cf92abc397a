//! `SeaORM` implementation of the `ReputationService` trait.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::db::{NewReputationEntry, Store, User};
use crate::services::reputation_service::{
    GiveReputation, GivenEntry, ReceivedEntry, ReputationError, ReputationHistory,
    ReputationService, ReputationStats,
};

pub struct SeaOrmReputationService {
    store: Store,
}

impl SeaOrmReputationService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ReputationService for SeaOrmReputationService {
    async fn history(&self, username: &str) -> Result<Option<ReputationHistory>, ReputationError> {
        let Some(user) = self.store.get_user_by_username(username).await? else {
            return Ok(None);
        };

        let received = self.store.reputation_received_by(user.id).await?;
        let given = self.store.reputation_given_by(user.id).await?;

        // Resolve counterparty names in one query instead of per entry
        let counterparty_ids: Vec<i32> = received
            .iter()
            .map(|e| e.giver_id)
            .chain(given.iter().map(|e| e.receiver_id))
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let usernames = self.store.usernames_by_ids(&counterparty_ids).await?;
        let resolve = |id: i32| {
            usernames
                .get(&id)
                .cloned()
                .unwrap_or_else(|| "[deleted]".to_string())
        };

        let total_received: i64 = received.iter().map(|e| i64::from(e.amount)).sum();
        let total_given: i64 = given.iter().map(|e| i64::from(e.amount)).sum();

        let stats = ReputationStats {
            username: user.username,
            total_received,
            total_given,
            received_count: received.len(),
            given_count: given.len(),
            current_reputation: total_received,
        };

        let received = received
            .into_iter()
            .map(|e| ReceivedEntry {
                id: e.id,
                amount: e.amount,
                reason: e.reason,
                created_at: e.created_at,
                giver: resolve(e.giver_id),
                thread_id: e.thread_id,
                comment_id: e.comment_id,
            })
            .collect();

        let given = given
            .into_iter()
            .map(|e| GivenEntry {
                id: e.id,
                amount: e.amount,
                reason: e.reason,
                created_at: e.created_at,
                receiver: resolve(e.receiver_id),
                thread_id: e.thread_id,
                comment_id: e.comment_id,
            })
            .collect();

        Ok(Some(ReputationHistory {
            user: stats,
            received,
            given,
        }))
    }

    async fn give(&self, actor: &User, input: GiveReputation) -> Result<(), ReputationError> {
        if input.amount == 0 {
            return Err(ReputationError::Validation(
                "Amount must not be zero".to_string(),
            ));
        }
        if input.reason.trim().is_empty() {
            return Err(ReputationError::Validation(
                "Reason is required".to_string(),
            ));
        }

        let Some(receiver) = self.store.get_user_by_username(&input.receiver).await? else {
            return Err(ReputationError::NotFound);
        };

        if receiver.id == actor.id {
            return Err(ReputationError::Validation(
                "You cannot give reputation to yourself".to_string(),
            ));
        }

        self.store
            .insert_reputation(NewReputationEntry {
                giver_id: actor.id,
                receiver_id: receiver.id,
                amount: input.amount,
                reason: input.reason.trim().to_string(),
                thread_id: input.thread_id,
                comment_id: input.comment_id,
            })
            .await?;

        tracing::info!(
            from = %actor.username,
            to = %input.receiver,
            amount = input.amount,
            "Reputation recorded"
        );
        Ok(())
    }
}

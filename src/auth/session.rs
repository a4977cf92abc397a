use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::db::{Session, Store, User};

/// Sessions live 30 days from creation or last renewal.
pub const SESSION_LIFETIME_SECS: i64 = 30 * 24 * 60 * 60;

/// Validation pushes the expiry forward once less than half the lifetime
/// remains. Renewing on every request would mean a write per validation;
/// the window keeps active users logged in while idle sessions lapse.
pub const RENEWAL_WINDOW_SECS: i64 = SESSION_LIFETIME_SECS / 2;

fn lifetime() -> TimeDelta {
    TimeDelta::seconds(SESSION_LIFETIME_SECS)
}

/// Session lifecycle: absent -> valid -> renewed -> expired -> deleted.
/// "No such session" and "expired" are values, not errors; only store
/// failures propagate.
#[derive(Clone)]
pub struct SessionService {
    store: Store,
}

impl SessionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_session(&self, token: &str, user_id: i32) -> Result<Session> {
        let expires_at = Utc::now() + lifetime();
        self.store.insert_session(token, user_id, &expires_at).await
    }

    /// Resolve a token to its session and owning user.
    ///
    /// Returns `Ok(None)` for unknown tokens and for expired sessions;
    /// expired rows are deleted on the way out. Valid sessions inside the
    /// renewal window get a fresh full lifetime before being returned.
    pub async fn validate_session(&self, token: &str) -> Result<Option<(Session, User)>> {
        self.validate_session_at(token, Utc::now()).await
    }

    pub async fn validate_session_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<(Session, User)>> {
        let Some(mut session) = self.store.get_session(token).await? else {
            return Ok(None);
        };

        if session.expires_at <= now {
            self.store.delete_session(token).await?;
            debug!("Expired session pruned during validation");
            return Ok(None);
        }

        let Some(user) = self.store.get_user_by_id(session.user_id).await? else {
            // Owner row is gone; the session proves nothing anymore.
            self.store.delete_session(token).await?;
            return Ok(None);
        };

        let remaining = session.expires_at - now;
        if remaining < TimeDelta::seconds(RENEWAL_WINDOW_SECS) {
            let renewed = now + lifetime();
            self.store.set_session_expiry(token, &renewed).await?;
            session.expires_at = renewed;
            debug!(username = %user.username, "Session renewed");
        }

        Ok(Some((session, user)))
    }

    /// Idempotent: invalidating an already-absent session is a no-op.
    pub async fn invalidate_session(&self, token: &str) -> Result<()> {
        self.store.delete_session(token).await
    }

    /// Remove sessions validation would reject anyway. Lazy expiry is
    /// sufficient for correctness; this only bounds table growth.
    pub async fn prune_expired(&self) -> Result<u64> {
        self.store.delete_expired_sessions(&Utc::now()).await
    }
}

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{prelude::*, sessions};

/// Fixed-width UTC format so stored timestamps compare lexicographically.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid session timestamp: {raw}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Session row with the expiry parsed out of its storage form.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<sessions::Model> for Session {
    type Error = anyhow::Error;

    fn try_from(model: sessions::Model) -> Result<Self> {
        let expires_at = parse_timestamp(&model.expires_at)?;
        Ok(Self {
            token: model.token,
            user_id: model.user_id,
            expires_at,
        })
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(
        &self,
        token: &str,
        user_id: i32,
        expires_at: &DateTime<Utc>,
    ) -> Result<Session> {
        let active = sessions::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(user_id),
            expires_at: Set(format_timestamp(expires_at)),
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Session::try_from(model)
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<Session>> {
        let session = Sessions::find_by_id(token)
            .one(&self.conn)
            .await
            .context("Failed to query session")?;

        session.map(Session::try_from).transpose()
    }

    /// Push the expiry forward. Missing rows are ignored; a concurrent
    /// validation may have already pruned the session.
    pub async fn set_expiry(&self, token: &str, expires_at: &DateTime<Utc>) -> Result<()> {
        Sessions::update_many()
            .col_expr(
                sessions::Column::ExpiresAt,
                sea_orm::sea_query::Expr::value(format_timestamp(expires_at)),
            )
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to update session expiry")?;

        Ok(())
    }

    /// Idempotent: deleting an absent session is not an error.
    pub async fn delete_by_token(&self, token: &str) -> Result<()> {
        Sessions::delete_many()
            .filter(sessions::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Prune sessions whose expiry has passed. Validation already rejects
    /// them lazily; this only keeps the table from accumulating stale rows.
    pub async fn delete_expired(&self, now: &DateTime<Utc>) -> Result<u64> {
        let result = Sessions::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(format_timestamp(now)))
            .exec(&self.conn)
            .await
            .context("Failed to prune expired sessions")?;

        Ok(result.rows_affected)
    }
}

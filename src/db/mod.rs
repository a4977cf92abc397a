use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::category::{Category, CategoryDeleteOutcome};
pub use repositories::reputation::{NewReputationEntry, ReputationEntry};
pub use repositories::session::Session;
pub use repositories::user::{
    DeleteOutcome, RenameOutcome, Role, User, UserPage, UserSummary,
};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // A pooled in-memory SQLite would hand each connection its own
        // database, so memory stores are pinned to a single connection.
        let (max_connections, min_connections) = if db_url.contains(":memory:") {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn category_repo(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    fn reputation_repo(&self) -> repositories::reputation::ReputationRepository {
        repositories::reputation::ReputationRepository::new(self.conn.clone())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// `Ok(None)` means the username was already taken.
    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Option<User>> {
        self.user_repo().insert(username, password_hash, role).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_by_username_with_password(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn list_users(&self, page: u64, limit: u64, search: &str) -> Result<UserPage> {
        self.user_repo().list(page, limit, search).await
    }

    pub async fn usernames_by_ids(&self, ids: &[i32]) -> Result<HashMap<i32, String>> {
        self.user_repo().usernames_by_ids(ids).await
    }

    pub async fn rename_user(
        &self,
        old_username: &str,
        new_username: &str,
        actor_id: i32,
    ) -> Result<RenameOutcome> {
        self.user_repo()
            .rename(old_username, new_username, actor_id)
            .await
    }

    pub async fn delete_user_cascading(
        &self,
        username: &str,
        actor_id: i32,
    ) -> Result<DeleteOutcome> {
        self.user_repo().delete_cascading(username, actor_id).await
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn insert_session(
        &self,
        token: &str,
        user_id: i32,
        expires_at: &DateTime<Utc>,
    ) -> Result<Session> {
        self.session_repo().insert(token, user_id, expires_at).await
    }

    pub async fn get_session(&self, token: &str) -> Result<Option<Session>> {
        self.session_repo().get_by_token(token).await
    }

    pub async fn set_session_expiry(
        &self,
        token: &str,
        expires_at: &DateTime<Utc>,
    ) -> Result<()> {
        self.session_repo().set_expiry(token, expires_at).await
    }

    pub async fn delete_session(&self, token: &str) -> Result<()> {
        self.session_repo().delete_by_token(token).await
    }

    pub async fn delete_expired_sessions(&self, now: &DateTime<Utc>) -> Result<u64> {
        self.session_repo().delete_expired(now).await
    }

    // ------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.category_repo().list_all().await
    }

    pub async fn list_active_categories(&self) -> Result<Vec<Category>> {
        self.category_repo().list_active().await
    }

    pub async fn get_category(&self, id: &str) -> Result<Option<Category>> {
        self.category_repo().get_by_id(id).await
    }

    pub async fn insert_category(
        &self,
        name: &str,
        description: &str,
        is_active: bool,
    ) -> Result<Category> {
        self.category_repo()
            .insert(name, description, is_active)
            .await
    }

    pub async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: &str,
        is_active: bool,
    ) -> Result<bool> {
        self.category_repo()
            .update(id, name, description, is_active)
            .await
    }

    pub async fn delete_category(&self, id: &str) -> Result<CategoryDeleteOutcome> {
        self.category_repo().delete(id).await
    }

    // ------------------------------------------------------------------
    // Reputation
    // ------------------------------------------------------------------

    pub async fn insert_reputation(&self, entry: NewReputationEntry) -> Result<ReputationEntry> {
        self.reputation_repo().insert(entry).await
    }

    pub async fn reputation_received_by(&self, user_id: i32) -> Result<Vec<ReputationEntry>> {
        self.reputation_repo().received_by(user_id).await
    }

    pub async fn reputation_given_by(&self, user_id: i32) -> Result<Vec<ReputationEntry>> {
        self.reputation_repo().given_by(user_id).await
    }
}

use std::sync::Arc;

use crate::auth::SessionService;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AccountService, CategoryService, ReputationService, SeaOrmAccountService,
    SeaOrmCategoryService, SeaOrmReputationService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub sessions: Arc<SessionService>,

    pub accounts: Arc<dyn AccountService>,

    pub categories: Arc<dyn CategoryService>,

    pub reputation: Arc<dyn ReputationService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let sessions = Arc::new(SessionService::new(store.clone()));

        let accounts = Arc::new(SeaOrmAccountService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AccountService>;

        let categories =
            Arc::new(SeaOrmCategoryService::new(store.clone())) as Arc<dyn CategoryService>;

        let reputation =
            Arc::new(SeaOrmReputationService::new(store.clone())) as Arc<dyn ReputationService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            sessions,
            accounts,
            categories,
            reputation,
        })
    }
}

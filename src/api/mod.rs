use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod auth;
mod categories;
mod error;
mod observability;
mod reputation;
mod system;
mod types;
mod users;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<crate::auth::SessionService> {
        &self.shared.sessions
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn crate::services::AccountService> {
        &self.shared.accounts
    }

    #[must_use]
    pub fn categories(&self) -> &Arc<dyn crate::services::CategoryService> {
        &self.shared.categories
    }

    #[must_use]
    pub fn reputation(&self) -> &Arc<dyn crate::services::ReputationService> {
        &self.shared.reputation
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    // Page-style reads inside the authenticated section: anonymous viewers
    // get redirected to /login instead of an error body.
    let page_routes = Router::new()
        .route(
            "/profile/reputation/{username}",
            get(reputation::reputation_history),
        )
        .route_layer(middleware::from_fn(auth::require_auth));

    // Mutating actions answer with {success, message} and never redirect;
    // they are invoked from already-rendered UI. The admin listing sits
    // here too: its handler issues the /login and /profile redirects.
    let action_routes = Router::new()
        .route("/profile/change-username", post(users::change_username))
        .route("/profile/reputation", post(reputation::give_reputation))
        .route("/admin/categories", get(categories::list_categories))
        .route("/admin/categories", post(categories::create_category))
        .route("/admin/categories/{id}", put(categories::update_category))
        .route(
            "/admin/categories/{id}",
            delete(categories::delete_category),
        )
        .route("/admin/users/{username}", delete(users::delete_user));

    let api_router = Router::new()
        .merge(page_routes)
        .merge(action_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/get-user/{username}", get(users::get_user))
        .route("/get-users", get(users::list_users))
        .route("/categories", get(categories::active_categories))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_gate,
        ))
        // Resolves the cookie itself so a broken session check degrades to
        // a logged-out response instead of a 500.
        .route("/auth", get(auth::auth_status))
        .route("/system/status", get(system::get_status))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

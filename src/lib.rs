pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use config::Config;
use state::SharedState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "agora")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let cli = cli::Cli::parse();

    match cli.command {
        None | Some(cli::Commands::Serve) => run_server(config, prometheus_handle).await,

        Some(cli::Commands::CreateAdmin { username, password }) => {
            cmd_create_admin(config, &username, &password).await
        }

        Some(cli::Commands::CleanupSessions) => cmd_cleanup_sessions(config).await,

        Some(cli::Commands::Init) => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it alone.");
            }
            Ok(())
        }
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Agora v{} starting...", env!("CARGO_PKG_VERSION"));

    let shared = Arc::new(SharedState::new(config.clone()).await?);

    let sweep_scheduler = if config.scheduler.session_sweep_enabled {
        let sweeper = scheduler::Sweeper::new(shared.sessions.clone(), config.scheduler.clone());
        Some(sweeper.start().await?)
    } else {
        None
    };

    let state = api::create_app_state(shared, prometheus_handle).await?;
    let app = api::router(state);

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    let server_handle = tokio::spawn(async move {
        info!("Web server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {e}");
        }
    });

    info!("Server running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {e}");
        }
    }

    if let Some(mut sched) = sweep_scheduler {
        let _ = sched.shutdown().await;
    }
    server_handle.abort();
    info!("Server stopped");

    Ok(())
}

async fn cmd_create_admin(config: Config, username: &str, password: &str) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    match shared.accounts.create_admin(username, password).await {
        Ok(user) => {
            println!("✓ Admin account '{}' created", user.username);
            Ok(())
        }
        Err(e) => anyhow::bail!("Failed to create admin account: {e}"),
    }
}

async fn cmd_cleanup_sessions(config: Config) -> anyhow::Result<()> {
    let shared = SharedState::new(config).await?;

    let pruned = shared.sessions.prune_expired().await?;
    println!("✓ Pruned {pruned} expired sessions");
    Ok(())
}

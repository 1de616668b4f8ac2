pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod library;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, cmd_cleanup_files, cmd_create_admin, cmd_init_db};
pub use config::Config;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists, leaving it untouched.");
            }
            Ok(())
        }

        Commands::InitDb => cmd_init_db(&config).await,

        Commands::CreateAdmin { username, password } => {
            cmd_create_admin(&config, &username, &password).await
        }

        Commands::CleanupFiles => cmd_cleanup_files(&config).await,
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Startup work that must happen before the first request.
///
/// Creates the bootstrap admin when none exists and, if enabled, removes
/// orphaned uploads. A failed cleanup is logged and never stops startup.
pub async fn bootstrap(shared: &SharedState) -> anyhow::Result<()> {
    shared
        .auth_service
        .ensure_default_admin()
        .await
        .context("Failed to create default admin")?;

    if shared.config().await.storage.cleanup_on_startup {
        match shared.video_service.cleanup_orphans().await {
            Ok(report) if report.is_partial_failure() => warn!(
                "Startup cleanup could not remove {} files",
                report.failed.len()
            ),
            Ok(report) => info!("Startup cleanup removed {} files", report.removed.len()),
            Err(e) => warn!("Startup cleanup failed: {}", e),
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("vidshare v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    bootstrap(&shared).await?;

    let app = api::router(api::create_app_state(shared, prometheus_handle)).await;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Web Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

pub mod accounts;
pub mod api;
pub mod appointment; // Lifecycle engine
pub mod authorization;
pub mod config;
pub mod core_state;
pub mod crypto;
pub mod db;
pub mod listing;
pub mod models;
pub mod notifications;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Signal handler failed: {0}")]
    Signal(#[from] std::io::Error),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let core = Arc::new(core_state::CoreState::open(&config)?);
    let server = api::start_api_server_on(core, config.bind_addr).await?;
    tracing::info!(addr = %server.session.server_addr, "listening");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    server.stop().await;

    Ok(())
}

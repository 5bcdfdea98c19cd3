pub mod api; // HTTP router, endpoints, server lifecycle
pub mod chatbot;
pub mod config;
pub mod core_state;
pub mod db;
pub mod diagnosis; // Rule cascade + staging model adapter
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError};
use crate::core_state::CoreState;
use crate::diagnosis::{ModelSet, Predictor};

/// Errors that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
    #[error("Signal handler error: {0}")]
    Signal(#[source] std::io::Error),
}

/// Start the backend and serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cfg = AppConfig::from_env()?;
    tracing::debug!(?cfg, "Configuration resolved");

    // Applies migrations before the first request arrives
    let conn = db::open_database(&cfg.db_path)?;
    if cfg.seed_demo {
        db::seed_demo_data(&conn)?;
    }
    drop(conn);

    let models = ModelSet::load_dir(&cfg.models_dir);
    if !models.is_ready() {
        tracing::info!(
            loaded = models.loaded_count(),
            "Staging models incomplete, using rule-based classification"
        );
    }
    let core = Arc::new(CoreState::new(&cfg.db_path, Predictor::new(models)));

    let mut server = api::start_server(core, cfg.bind, &cfg.cors_origins).await?;
    tracing::info!(
        addr = %server.session.server_addr,
        session = %server.session.session_id,
        "Listening"
    );

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}

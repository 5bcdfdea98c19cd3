//! HTTP server lifecycle: bind, spawn the axum server in a background
//! task, and hand back a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::router::api_router;
use crate::core_state::CoreState;

/// Session metadata for a running server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSession {
    pub session_id: String,
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Handle to a running server.
pub struct ApiServer {
    pub session: ServerSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Signal a graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn stopped(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

/// Bind `addr` (port 0 picks an ephemeral port), build the router and spawn
/// the server in a background tokio task.
pub async fn start_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = api_router(core, cors_origins);

    let session = ServerSession {
        session_id: Uuid::new_v4().to_string(),
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::db;
use crate::progression::storage::{SeaOrmSyncStorage, SyncStorage};

use super::routes::{AppContext, ProgressionApiServer};

const LOG_TARGET: &str = "server::bootstrap";

/// Connect, ensure the schema, and serve until a shutdown signal arrives.
/// The connection pool is owned here and closes when this returns.
pub async fn run_server(config: AppConfig) -> Result<()> {
    let connection = db::connect(&config.database_url, config.max_connections).await?;
    db::schema::init(&connection)
        .await
        .context("failed to initialize database schema")?;

    let storage: Arc<dyn SyncStorage> = Arc::new(SeaOrmSyncStorage::new(connection));
    let context = Arc::new(AppContext::new(storage, &config));
    let router = ProgressionApiServer::new(context).into_router();
    let make_service = router.into_make_service_with_connect_info::<SocketAddr>();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target = LOG_TARGET, %local_addr, "progression API listening");

    axum::serve(listener, make_service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = LOG_TARGET, error = %err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = LOG_TARGET, error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!(target = LOG_TARGET, "shutdown signal received");
}

//! tablesnap Server - Main entry point

use anyhow::Result;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tablesnap_common::logging::{init_logging, LogConfig};
use tablesnap_ingest::IngestOrchestrator;
use tokio::signal;
use tracing::info;

use tablesnap_server::{
    api::{self, AppState},
    config::Config,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("tablesnap-server")
        .filter_directives("tablesnap_server=debug,tablesnap_ingest=info,tower_http=debug")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    info!("Starting tablesnap server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let orchestrator = IngestOrchestrator::from_config(&config.ingest).await;
    info!(
        tables = orchestrator.registry().len(),
        bucket = %config.ingest.storage.bucket,
        "Ingestion clients initialized"
    );

    let app = api::create_router(AppState {
        orchestrator: Arc::new(orchestrator),
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Grace period for in-flight ingestion runs
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}

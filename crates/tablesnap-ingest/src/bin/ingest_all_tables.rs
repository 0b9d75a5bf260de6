//! Lambda entry point: ingest every registered table in one run

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use tablesnap_common::logging::{init_logging, LogConfig, LogFormat};
use tablesnap_ingest::{config::IngestConfig, lambda, IngestOrchestrator};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let log_config = LogConfig::builder()
        .format(LogFormat::Json)
        .include_time(false)
        .build()
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    let config = IngestConfig::from_env()?;
    if let Err(e) = config.validate() {
        warn!(error = %e, "Configuration incomplete, ingestion may fail");
    }
    let orchestrator = IngestOrchestrator::from_config(&config).await;

    run(service_fn(|_event: LambdaEvent<Value>| {
        let orchestrator = &orchestrator;
        async move { Ok::<_, Error>(lambda::handle_ingest_all(orchestrator).await) }
    }))
    .await
}

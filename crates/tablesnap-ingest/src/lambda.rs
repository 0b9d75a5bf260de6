//! Serverless function handlers
//!
//! Both handlers answer in the API Gateway proxy shape: a status code and a
//! body holding a JSON document as a string.

use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::{error, info, warn};

use crate::orchestrator::IngestOrchestrator;
use crate::report::TableIngest;
use crate::writer::SnapshotFormat;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaResponse {
    pub status_code: u16,
    pub body: String,
}

impl LambdaResponse {
    fn json(status_code: u16, body: &JsonValue) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }
}

/// Table key from `pathParameters.tableName`
pub fn table_from_event(event: &JsonValue) -> Option<&str> {
    event
        .get("pathParameters")
        .and_then(|params| params.get("tableName"))
        .and_then(JsonValue::as_str)
        .filter(|name| !name.trim().is_empty())
}

/// Ingest the table named in the event
pub async fn handle_ingest_table(orchestrator: &IngestOrchestrator, event: &JsonValue) -> LambdaResponse {
    let Some(table_key) = table_from_event(event) else {
        warn!("Invocation without a table name");
        let available: Vec<&str> = orchestrator.registry().keys().collect();
        return LambdaResponse::json(
            400,
            &json!({
                "error": format!("Invalid table name. Valid tables: {}", available.join(", "))
            }),
        );
    };

    match orchestrator.ingest_table(table_key, SnapshotFormat::default()).await {
        Ok(ingested) => match ingested.result {
            TableIngest::Written { records, s3_location } => LambdaResponse::json(
                200,
                &json!({
                    "message": "Ingestion completed successfully",
                    "table": ingested.table,
                    "records": records,
                    "s3_location": s3_location,
                }),
            ),
            TableIngest::Empty => LambdaResponse::json(
                200,
                &json!({
                    "message": format!("Table {} is empty", ingested.table),
                    "table": ingested.table,
                    "records": 0,
                }),
            ),
        },
        Err(e) if e.is_caller_error() => {
            warn!(table = %table_key, "Rejected unknown table");
            LambdaResponse::json(400, &json!({ "error": e.to_string() }))
        },
        Err(e) => {
            error!(table = %table_key, error = %e, "Ingestion failed");
            LambdaResponse::json(
                500,
                &json!({ "error": "Error during ingestion", "details": e.to_string() }),
            )
        },
    }
}

/// Ingest every registered table
///
/// 200 when every table succeeded or was empty, 207 when any failed.
pub async fn handle_ingest_all(orchestrator: &IngestOrchestrator) -> LambdaResponse {
    let report = orchestrator.ingest_all().await;
    let status_code = if report.has_errors() { 207 } else { 200 };

    info!(status_code, failed = report.failed, "All-tables ingestion finished");

    match serde_json::to_value(&report) {
        Ok(body) => LambdaResponse::json(status_code, &body),
        Err(e) => LambdaResponse::json(
            500,
            &json!({ "error": "Error during ingestion", "details": e.to_string() }),
        ),
    }
}

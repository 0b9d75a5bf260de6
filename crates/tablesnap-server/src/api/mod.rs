//! HTTP routes
//!
//! | Method | Path                  | Purpose                               |
//! |--------|-----------------------|---------------------------------------|
//! | GET    | `/`                   | Liveness                              |
//! | GET    | `/health`             | DynamoDB and S3 reachability          |
//! | POST   | `/ingest/all`         | Snapshot every registered table       |
//! | POST   | `/ingest/:table_key`  | Snapshot one table (`?format=array`)  |
//! | GET    | `/snapshots`          | List stored snapshots (`?prefix=`)    |

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tablesnap_ingest::{IngestOrchestrator, SnapshotFormat, TableIngest};
use tracing::info;

use crate::error::AppError;
use crate::middleware;

pub const SERVICE_NAME: &str = "tablesnap ingestion API";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<IngestOrchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ingest/all", post(ingest_all))
        .route("/ingest/:table_key", post(ingest_table))
        .route("/snapshots", get(list_snapshots))
        .with_state(state)
        .layer(middleware::compression_layer())
        .layer(middleware::tracing_layer())
}

async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
        "timestamp": state.orchestrator.now(),
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    let report = state.orchestrator.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(report)).into_response()
}

async fn ingest_all(State(state): State<AppState>) -> Response {
    let report = state.orchestrator.ingest_all().await;
    let status = if report.has_errors() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };

    (status, Json(report)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct IngestParams {
    pub format: Option<String>,
}

async fn ingest_table(
    State(state): State<AppState>,
    Path(table_key): Path<String>,
    Query(params): Query<IngestParams>,
) -> Result<Response, AppError> {
    let format = match params.format.as_deref() {
        Some(raw) => raw
            .parse::<SnapshotFormat>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => SnapshotFormat::default(),
    };

    info!(table = %table_key, format = %format, "Ingestion requested");

    let ingested = state.orchestrator.ingest_table(&table_key, format).await?;
    let timestamp = state.orchestrator.now();

    let response = match ingested.result {
        TableIngest::Written {
            records,
            s3_location,
        } => Json(json!({
            "status": "success",
            "table": ingested.table,
            "records_extracted": records,
            "s3_location": s3_location,
            "format": format,
            "timestamp": timestamp,
        }))
        .into_response(),
        TableIngest::Empty => Json(json!({
            "message": format!("Table {} is empty", ingested.table),
            "records_extracted": 0,
        }))
        .into_response(),
    };

    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct SnapshotParams {
    #[serde(default)]
    pub prefix: String,
}

async fn list_snapshots(
    State(state): State<AppState>,
    Query(params): Query<SnapshotParams>,
) -> Result<Response, AppError> {
    let objects = state.orchestrator.list_snapshots(&params.prefix).await?;

    Ok(Json(json!({
        "prefix": params.prefix,
        "count": objects.len(),
        "objects": objects,
    }))
    .into_response())
}

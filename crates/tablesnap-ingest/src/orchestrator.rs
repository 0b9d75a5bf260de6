//! Ingestion orchestrator
//!
//! Ties the registry, scanner and writer together. Single-table ingestion
//! surfaces failures to the caller; the all-tables run records every
//! per-table failure in its report and keeps going.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tablesnap_common::Result;
use tracing::{error, info, instrument, warn};

use crate::clock::{run_stamp, Clock, SystemClock};
use crate::config::{IngestConfig, SnapshotConfig};
use crate::dynamo::{DynamoScanClient, TableScanClient};
use crate::health::{BackendStatus, HealthReport};
use crate::registry::TableRegistry;
use crate::report::{AggregateReport, IngestedTable, IngestionOutcome, TableIngest, TableReport};
use crate::scanner::TableScanner;
use crate::storage::{ObjectStore, S3ObjectStore, StoredObject};
use crate::writer::{SnapshotFormat, SnapshotWriter};

pub struct IngestOrchestrator {
    registry: Arc<TableRegistry>,
    scan_client: Arc<dyn TableScanClient>,
    store: Arc<dyn ObjectStore>,
    scanner: TableScanner,
    writer: SnapshotWriter,
    database: String,
    clock: Arc<dyn Clock>,
}

impl IngestOrchestrator {
    pub fn new(
        registry: TableRegistry,
        scan_client: Arc<dyn TableScanClient>,
        store: Arc<dyn ObjectStore>,
        snapshot: &SnapshotConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(registry);
        let scanner = TableScanner::new(scan_client.clone(), registry.clone());
        let writer = SnapshotWriter::new(store.clone(), snapshot.source.clone(), clock.clone());

        Self {
            registry,
            scan_client,
            store,
            scanner,
            writer,
            database: snapshot.database.clone(),
            clock,
        }
    }

    /// Build the production clients from configuration
    pub async fn from_config(config: &IngestConfig) -> Self {
        let sdk_config = config.load_sdk_config().await;

        let scan_client = Arc::new(DynamoScanClient::new(
            &sdk_config,
            config.aws.dynamodb_endpoint.as_deref(),
        ));
        let store = Arc::new(S3ObjectStore::new(&sdk_config, config.storage.clone()));

        Self::new(
            config.registry(),
            scan_client,
            store,
            &config.snapshot,
            Arc::new(SystemClock),
        )
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Ingest one table, surfacing any failure to the caller
    ///
    /// An empty table yields [`TableIngest::Empty`] and writes nothing.
    #[instrument(skip(self))]
    pub async fn ingest_table(&self, table_key: &str, format: SnapshotFormat) -> Result<IngestedTable> {
        let run_at = self.clock.now();
        self.ingest_at(table_key, format, run_at).await
    }

    /// Ingest one table in the default format, folding failures into the report
    pub async fn ingest_one(&self, table_key: &str) -> TableReport {
        let run_at = self.clock.now();
        self.ingest_recorded(table_key, run_at).await
    }

    /// Ingest every registered table sequentially, in registration order
    ///
    /// Never fails; per-table errors are collected in the report.
    #[instrument(skip(self))]
    pub async fn ingest_all(&self) -> AggregateReport {
        let run_at = self.clock.now();
        let keys: Vec<String> = self.registry.keys().map(str::to_string).collect();

        info!(tables = keys.len(), run = %run_stamp(run_at), "Starting ingestion of all tables");

        let mut results = Vec::with_capacity(keys.len());
        for key in &keys {
            results.push(self.ingest_recorded(key, run_at).await);
        }

        let report = AggregateReport::from_results(run_stamp(run_at), results, self.clock.now());

        info!(
            successful = report.successful,
            empty = report.empty,
            failed = report.failed,
            total_records = report.total_records,
            "Ingestion of all tables finished"
        );

        report
    }

    /// Probe both backends
    pub async fn health(&self) -> HealthReport {
        let dynamodb = BackendStatus::from_probe(self.scan_client.ping().await);
        let s3 = BackendStatus::from_probe(self.store.ping().await);

        HealthReport {
            dynamodb,
            s3,
            timestamp: self.clock.now(),
        }
    }

    pub async fn list_snapshots(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        self.writer.list_snapshots(prefix).await
    }

    async fn ingest_recorded(&self, table_key: &str, run_at: DateTime<Utc>) -> TableReport {
        match self.ingest_at(table_key, SnapshotFormat::default(), run_at).await {
            Ok(ingested) => ingested.into(),
            Err(e) => {
                error!(table = %table_key, error = %e, "Table ingestion failed");
                TableReport {
                    table: table_key.to_string(),
                    physical_table: self.registry.resolve(table_key).ok().map(str::to_string),
                    outcome: IngestionOutcome::Error {
                        error: e.to_string(),
                    },
                }
            },
        }
    }

    async fn ingest_at(
        &self,
        table_key: &str,
        format: SnapshotFormat,
        run_at: DateTime<Utc>,
    ) -> Result<IngestedTable> {
        let snapshot = self.scanner.snapshot(table_key, run_at).await?;

        if snapshot.is_empty() {
            warn!(table = %snapshot.table_key, "Table is empty, nothing written");
            return Ok(IngestedTable {
                table: snapshot.table_key,
                physical_table: snapshot.physical_table,
                result: TableIngest::Empty,
            });
        }

        let location = self
            .writer
            .write(
                &snapshot.records,
                &self.database,
                &snapshot.table_key,
                format,
                snapshot.captured_at,
            )
            .await?;

        info!(
            table = %snapshot.table_key,
            records = snapshot.record_count(),
            location = %location,
            "Table ingested"
        );

        Ok(IngestedTable {
            result: TableIngest::Written {
                records: snapshot.record_count(),
                s3_location: location,
            },
            table: snapshot.table_key,
            physical_table: snapshot.physical_table,
        })
    }
}

impl std::fmt::Debug for IngestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestOrchestrator")
            .field("tables", &self.registry.len())
            .field("bucket", &self.writer.bucket())
            .field("database", &self.database)
            .finish()
    }
}


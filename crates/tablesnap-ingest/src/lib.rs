//! tablesnap ingestion core
//!
//! Extracts full-table snapshots from DynamoDB and deposits them in S3 as
//! date-partitioned JSON objects that Athena can query directly.
//!
//! # Pipeline
//!
//! - [`registry`]: logical table keys to physical table names
//! - [`scanner`]: drains a paginated scan and normalizes every record
//! - [`normalize`]: decimals become integers or floats
//! - [`writer`]: encodes records and uploads them under a partitioned key
//! - [`orchestrator`]: single-table and all-tables runs with a report
//!
//! The HTTP server and the Lambda binaries are thin adapters over
//! [`orchestrator::IngestOrchestrator`].
//!
//! # Example
//!
//! ```no_run
//! use tablesnap_ingest::{config::IngestConfig, orchestrator::IngestOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let orchestrator = IngestOrchestrator::from_config(&config).await;
//!     let report = orchestrator.ingest_all().await;
//!     println!("{} records", report.total_records);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod clock;
pub mod config;
pub mod dynamo;
pub mod health;
pub mod lambda;
pub mod normalize;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod scanner;
pub mod storage;
pub mod value;
pub mod writer;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use orchestrator::IngestOrchestrator;
pub use report::{AggregateReport, IngestedTable, IngestionOutcome, TableIngest, TableReport};
pub use writer::SnapshotFormat;

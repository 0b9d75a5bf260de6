//! Ingestion outcomes and the batch report

use chrono::{DateTime, Utc};
use serde::Serialize;

/// What happened to one table during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IngestionOutcome {
    Success { records: usize, s3_location: String },
    Empty,
    Error { error: String },
}

impl IngestionOutcome {
    pub fn records(&self) -> usize {
        match self {
            IngestionOutcome::Success { records, .. } => *records,
            IngestionOutcome::Empty | IngestionOutcome::Error { .. } => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, IngestionOutcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, IngestionOutcome::Error { .. })
    }
}

/// Per-table entry in a run report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableReport {
    pub table: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_table: Option<String>,
    #[serde(flatten)]
    pub outcome: IngestionOutcome,
}

/// How a single-table ingestion that ran to completion ended
///
/// Failures are reported through the `Err` side of the call instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIngest {
    Written { records: usize, s3_location: String },
    Empty,
}

/// A table that was scanned and, unless empty, written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedTable {
    pub table: String,
    pub physical_table: String,
    pub result: TableIngest,
}

impl IngestedTable {
    pub fn records(&self) -> usize {
        match &self.result {
            TableIngest::Written { records, .. } => *records,
            TableIngest::Empty => 0,
        }
    }
}

impl From<IngestedTable> for TableReport {
    fn from(ingested: IngestedTable) -> Self {
        let outcome = match ingested.result {
            TableIngest::Written {
                records,
                s3_location,
            } => IngestionOutcome::Success {
                records,
                s3_location,
            },
            TableIngest::Empty => IngestionOutcome::Empty,
        };

        TableReport {
            table: ingested.table,
            physical_table: Some(ingested.physical_table),
            outcome,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableError {
    pub table: String,
    pub error: String,
}

/// Summary of an all-tables run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub status: RunStatus,
    /// Stamp shared by every object written during the run
    pub run_timestamp: String,
    pub total_tables: usize,
    pub successful: usize,
    pub empty: usize,
    pub failed: usize,
    pub total_records: usize,
    pub results: Vec<TableReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<TableError>,
    pub timestamp: DateTime<Utc>,
}

impl AggregateReport {
    /// Fold ordered per-table results into a report
    pub fn from_results(run_timestamp: String, results: Vec<TableReport>, finished_at: DateTime<Utc>) -> Self {
        let errors: Vec<TableError> = results
            .iter()
            .filter_map(|r| match &r.outcome {
                IngestionOutcome::Error { error } => Some(TableError {
                    table: r.table.clone(),
                    error: error.clone(),
                }),
                _ => None,
            })
            .collect();

        let successful = results.iter().filter(|r| r.outcome.is_success()).count();
        let empty = results
            .iter()
            .filter(|r| r.outcome == IngestionOutcome::Empty)
            .count();

        Self {
            status: if errors.is_empty() {
                RunStatus::Completed
            } else {
                RunStatus::CompletedWithErrors
            },
            run_timestamp,
            total_tables: results.len(),
            successful,
            empty,
            failed: errors.len(),
            total_records: results.iter().map(|r| r.outcome.records()).sum(),
            results,
            errors,
            timestamp: finished_at,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

//! Full-table scanner
//!
//! Drains a paginated scan to completion and normalizes every record. A scan
//! is all-or-nothing: if any page fails, the pages already fetched are
//! dropped and the whole table is reported as failed.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tablesnap_common::{Result, SnapshotError};
use tracing::{debug, info, instrument};

use crate::dynamo::TableScanClient;
use crate::normalize::normalize_record;
use crate::registry::TableRegistry;
use crate::value::{record_from_item, Record};

/// Records captured from one table during one scan pass
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table_key: String,
    pub physical_table: String,
    pub captured_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct TableScanner {
    client: Arc<dyn TableScanClient>,
    registry: Arc<TableRegistry>,
}

impl TableScanner {
    pub fn new(client: Arc<dyn TableScanClient>, registry: Arc<TableRegistry>) -> Self {
        Self { client, registry }
    }

    /// Scan the table registered under `table_key` and return its normalized records
    pub async fn scan(&self, table_key: &str) -> Result<Vec<Record>> {
        let physical = self.registry.resolve(table_key)?;
        self.scan_physical(physical).await
    }

    /// Scan a table and stamp the result with its provenance
    pub async fn snapshot(&self, table_key: &str, captured_at: DateTime<Utc>) -> Result<Snapshot> {
        let entry = self.registry.entry(table_key)?;
        let records = self.scan_physical(&entry.physical_name).await?;

        Ok(Snapshot {
            table_key: entry.key.clone(),
            physical_table: entry.physical_name.clone(),
            captured_at,
            records,
        })
    }

    #[instrument(skip(self))]
    async fn scan_physical(&self, table_name: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut start_key = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .client
                .scan_page(table_name, start_key)
                .await
                .map_err(|e| SnapshotError::Scan {
                    table: table_name.to_string(),
                    message: format!("{e:#}"),
                })?;
            pages += 1;

            records.extend(
                page.items
                    .into_iter()
                    .map(|item| normalize_record(record_from_item(item))),
            );

            debug!(table = %table_name, page = pages, total = records.len(), "Scan page merged");

            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }

        info!(table = %table_name, records = records.len(), pages, "Scanned table");

        Ok(records)
    }
}

//! In-memory store fakes for unit and integration tests

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::clock::Clock;
use crate::dynamo::{ScanPage, TableScanClient};
use crate::storage::{location, ObjectStore, PutObjectRequest, StoredObject, UploadResult};
use crate::value::Item;

/// Build an item from `(name, attribute)` pairs
pub fn item<const N: usize>(pairs: [(&str, AttributeValue); N]) -> Item {
    pairs
        .into_iter()
        .map(|(name, attribute)| (name.to_string(), attribute))
        .collect()
}

#[derive(Debug, Default)]
struct FakeTable {
    pages: Vec<Vec<Item>>,
    /// 1-based page number that fails, with its message
    failure: Option<(usize, String)>,
}

/// Scan client serving fixed pages per physical table
///
/// Tables that were never configured scan as empty. Continuation tokens are
/// the index of the next page.
#[derive(Debug, Default)]
pub struct FakeScanClient {
    tables: HashMap<String, FakeTable>,
    calls: Mutex<HashMap<String, usize>>,
    unreachable: Option<String>,
}

impl FakeScanClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, table: &str, pages: Vec<Vec<Item>>) -> Self {
        self.tables.entry(table.to_string()).or_default().pages = pages;
        self
    }

    /// Fail every scan of `table` on its first page
    pub fn failing(self, table: &str, message: &str) -> Self {
        self.failing_at_page(table, 1, message)
    }

    pub fn failing_at_page(mut self, table: &str, page: usize, message: &str) -> Self {
        self.tables.entry(table.to_string()).or_default().failure = Some((page, message.to_string()));
        self
    }

    /// Make health probes fail
    pub fn unreachable(mut self, message: &str) -> Self {
        self.unreachable = Some(message.to_string());
        self
    }

    pub fn calls(&self, table: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(table).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }
}

fn page_token(index: usize) -> Item {
    item([("page", AttributeValue::N(index.to_string()))])
}

#[async_trait]
impl TableScanClient for FakeScanClient {
    async fn scan_page(&self, table_name: &str, exclusive_start_key: Option<Item>) -> Result<ScanPage> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(table_name.to_string()).or_default() += 1;
        }

        let index = match exclusive_start_key {
            None => 0,
            Some(key) => match key.get("page") {
                Some(AttributeValue::N(n)) => n.parse::<usize>()?,
                _ => bail!("malformed continuation token"),
            },
        };

        let Some(table) = self.tables.get(table_name) else {
            return Ok(ScanPage::default());
        };

        if let Some((page, message)) = &table.failure {
            if *page == index + 1 {
                return Err(anyhow!("{message}"));
            }
        }

        let items = table.pages.get(index).cloned().unwrap_or_default();
        let last_evaluated_key = (index + 1 < table.pages.len()).then(|| page_token(index + 1));

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn ping(&self) -> Result<()> {
        match &self.unreachable {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

/// Object store keeping every PUT in memory
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    bucket: String,
    puts: Mutex<Vec<PutObjectRequest>>,
    failure: Option<String>,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Self::default()
        }
    }

    /// Fail every PUT, list and probe with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn puts(&self) -> Vec<PutObjectRequest> {
        self.puts.lock().map(|puts| puts.clone()).unwrap_or_default()
    }

    /// Body of the object stored under `key`, as text
    pub fn body(&self, key: &str) -> Option<String> {
        self.puts()
            .into_iter()
            .rev()
            .find(|put| put.key == key)
            .and_then(|put| String::from_utf8(put.body).ok())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<UploadResult> {
        if let Some(message) = &self.failure {
            bail!("{message}");
        }

        let result = UploadResult {
            key: request.key.clone(),
            checksum: String::new(),
            size: request.body.len() as i64,
        };
        self.puts
            .lock()
            .map_err(|_| anyhow!("object store lock poisoned"))?
            .push(request);
        Ok(result)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        if let Some(message) = &self.failure {
            bail!("{message}");
        }

        Ok(self
            .puts()
            .into_iter()
            .filter(|put| put.key.starts_with(prefix))
            .map(|put| StoredObject {
                location: location(&self.bucket, &put.key),
                size: put.body.len() as i64,
                last_modified: None,
                key: put.key,
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

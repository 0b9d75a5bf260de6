//! Shared fixtures for ingestion integration tests

#![allow(dead_code)]

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tablesnap_ingest::config::SnapshotConfig;
use tablesnap_ingest::registry::TableRegistry;
use tablesnap_ingest::testing::{FakeScanClient, FixedClock, MemoryObjectStore};
use tablesnap_ingest::IngestOrchestrator;

pub const BUCKET: &str = "chinawok-datalake";

pub fn run_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 14, 30, 9).unwrap()
}

pub fn n(value: &str) -> AttributeValue {
    AttributeValue::N(value.to_string())
}

pub fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

pub struct Harness {
    pub client: Arc<FakeScanClient>,
    pub store: Arc<MemoryObjectStore>,
    pub orchestrator: IngestOrchestrator,
}

pub fn harness<const N: usize>(tables: [(&str, &str); N], client: FakeScanClient) -> Harness {
    harness_with_store(tables, client, MemoryObjectStore::new(BUCKET))
}

pub fn harness_with_store<const N: usize>(
    tables: [(&str, &str); N],
    client: FakeScanClient,
    store: MemoryObjectStore,
) -> Harness {
    let client = Arc::new(client);
    let store = Arc::new(store);
    let orchestrator = IngestOrchestrator::new(
        TableRegistry::new(tables),
        client.clone(),
        store.clone(),
        &SnapshotConfig::default(),
        Arc::new(FixedClock(run_at())),
    );

    Harness {
        client,
        store,
        orchestrator,
    }
}

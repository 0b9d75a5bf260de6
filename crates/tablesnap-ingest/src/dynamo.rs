//! DynamoDB scan client
//!
//! [`TableScanClient`] is the seam the scanner pages through. The production
//! implementation wraps the AWS SDK client; tests use an in-memory fake.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::{error::DisplayErrorContext, Client};
use tracing::{debug, info};

use crate::value::Item;

/// One page of a full-table scan
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Continuation token; `None` once the table is exhausted
    pub last_evaluated_key: Option<Item>,
}

/// Read-only access to a paginated table scan
#[async_trait]
pub trait TableScanClient: Send + Sync {
    /// Fetch one scan page, starting after `exclusive_start_key` when given
    async fn scan_page(&self, table_name: &str, exclusive_start_key: Option<Item>)
        -> Result<ScanPage>;

    /// Cheap reachability probe used by health checks
    async fn ping(&self) -> Result<()>;
}

/// [`TableScanClient`] backed by the AWS SDK
#[derive(Clone)]
pub struct DynamoScanClient {
    client: Client,
}

impl DynamoScanClient {
    /// Create a client from shared AWS configuration, optionally pointed at a
    /// local endpoint (DynamoDB Local, LocalStack)
    pub fn new(sdk_config: &SdkConfig, endpoint_url: Option<&str>) -> Self {
        let client = match endpoint_url {
            Some(endpoint) => {
                let dynamo_config = aws_sdk_dynamodb::config::Builder::from(sdk_config)
                    .endpoint_url(endpoint)
                    .build();
                Client::from_conf(dynamo_config)
            },
            None => Client::new(sdk_config),
        };

        info!(
            region = ?sdk_config.region(),
            endpoint = ?endpoint_url,
            "DynamoDB client initialized"
        );

        Self { client }
    }
}

#[async_trait]
impl TableScanClient for DynamoScanClient {
    async fn scan_page(
        &self,
        table_name: &str,
        exclusive_start_key: Option<Item>,
    ) -> Result<ScanPage> {
        let output = self
            .client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        let items = output.items.unwrap_or_default();
        let last_evaluated_key = output.last_evaluated_key.filter(|key| !key.is_empty());

        debug!(
            table = %table_name,
            items = items.len(),
            more = last_evaluated_key.is_some(),
            "Fetched scan page"
        );

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .list_tables()
            .limit(1)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;
        Ok(())
    }
}

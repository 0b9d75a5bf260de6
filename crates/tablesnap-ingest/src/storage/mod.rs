use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    error::DisplayErrorContext, primitives::ByteStream, types::ServerSideEncryption, Client,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument};

pub mod config;

/// A single-object PUT
#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: BTreeMap<String, String>,
    /// Ask for server-side encryption at rest (SSE-S3)
    pub encrypt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

/// Listing entry for an object already in the bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<DateTime<Utc>>,
    pub location: String,
}

/// Write/list access to the snapshot bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket every call targets
    fn bucket(&self) -> &str;

    async fn put_object(&self, request: PutObjectRequest) -> Result<UploadResult>;

    async fn list_objects(&self, prefix: &str) -> Result<Vec<StoredObject>>;

    /// Cheap reachability probe used by health checks
    async fn ping(&self) -> Result<()>;
}

/// [`ObjectStore`] backed by the AWS S3 SDK
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &SdkConfig, config: config::StorageConfig) -> Self {
        debug!("Initializing object store with config: {:?}", config);

        let mut builder = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(config.path_style);

        if let Some((access_key, secret_key)) = config.static_credentials() {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "tablesnap-storage",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket, "Object store client initialized");

        Self {
            client,
            bucket: config.bucket,
        }
    }

    pub fn location(&self, key: &str) -> String {
        location(&self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self, request), fields(key = %request.key))]
    async fn put_object(&self, request: PutObjectRequest) -> Result<UploadResult> {
        let checksum = calculate_sha256(&request.body);
        let size = request.body.len() as i64;

        debug!("Uploading {} bytes to {}", size, self.location(&request.key));

        let mut put = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&request.key)
            .content_type(request.content_type)
            .set_metadata(Some(request.metadata.into_iter().collect::<HashMap<_, _>>()))
            .body(ByteStream::from(request.body));

        if request.encrypt {
            put = put.server_side_encryption(ServerSideEncryption::Aes256);
        }

        put.send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

        info!("Successfully uploaded to {}", self.location(&request.key));

        Ok(UploadResult {
            key: request.key,
            checksum,
            size,
        })
    }

    #[instrument(skip(self))]
    async fn list_objects(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let mut objects = Vec::new();
        let mut continuation_token = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token)
                .send()
                .await
                .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;

            objects.extend(response.contents().iter().filter_map(|obj| {
                let key = obj.key()?;
                Some(StoredObject {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0),
                    last_modified: obj
                        .last_modified()
                        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())),
                    location: self.location(key),
                })
            }));

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Listed {} objects under {}", objects.len(), self.location(prefix));

        Ok(objects)
    }

    async fn ping(&self) -> Result<()> {
        if self.bucket.is_empty() {
            bail!("S3 bucket name is not configured");
        }

        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| anyhow!("{}", DisplayErrorContext(e)))?;
        Ok(())
    }
}

/// Fully qualified `s3://bucket/key` location
pub fn location(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location() {
        assert_eq!(
            location("chinawok-datalake", "dynamodb/locales/x.json"),
            "s3://chinawok-datalake/dynamodb/locales/x.json"
        );
    }

    #[test]
    fn test_calculate_sha256() {
        let checksum = calculate_sha256(b"Hello, World!");
        assert_eq!(
            checksum,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_store_reports_configured_bucket() {
        let sdk_config = SdkConfig::builder().build();
        let store = S3ObjectStore::new(
            &sdk_config,
            config::StorageConfig::for_minio("http://localhost:9000", "snapshots"),
        );
        assert_eq!(store.bucket(), "snapshots");
        assert_eq!(store.location("a/b.json"), "s3://snapshots/a/b.json");
    }
}

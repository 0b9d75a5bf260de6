use serde::{Deserialize, Serialize};
use std::env;

/// Object store settings for snapshot output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Destination bucket; empty means unconfigured
    pub bucket: String,
    /// Endpoint override for S3-compatible stores (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub path_style: bool,
    /// Static credentials; when absent the shared AWS provider chain is used
    pub access_key: Option<String>,
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        Self {
            bucket: env::var("S3_BUCKET_NAME")
                .or_else(|_| env::var("S3_BUCKET"))
                .unwrap_or_default(),
            endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            access_key: env::var("S3_ACCESS_KEY").ok().filter(|s| !s.is_empty()),
            secret_key: env::var("S3_SECRET_KEY").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn for_minio(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: Some(endpoint.into()),
            path_style: true,
            access_key: Some("minioadmin".to_string()),
            secret_key: Some("minioadmin".to_string()),
        }
    }

    /// Static credentials when both halves are present
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_for_minio() {
        let config = StorageConfig::for_minio("http://localhost:9000", "snapshots");
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.bucket, "snapshots");
        assert!(config.path_style);
        assert_eq!(config.static_credentials(), Some(("minioadmin", "minioadmin")));
    }

    #[test]
    #[serial]
    fn test_from_env_without_bucket_is_unconfigured() {
        env::remove_var("S3_BUCKET_NAME");
        env::remove_var("S3_BUCKET");
        env::remove_var("S3_ACCESS_KEY");

        let config = StorageConfig::from_env();
        assert!(config.bucket.is_empty());
        assert!(config.static_credentials().is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_bucket() {
        env::set_var("S3_BUCKET_NAME", "chinawok-datalake");
        let config = StorageConfig::from_env();
        env::remove_var("S3_BUCKET_NAME");

        assert_eq!(config.bucket, "chinawok-datalake");
    }
}

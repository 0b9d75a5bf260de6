//! Ingestion configuration
//!
//! Loaded once per process from environment variables (and a `.env` file when
//! present), then sliced into the parts each component needs.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use serde::{Deserialize, Serialize};
use std::env;
use tablesnap_common::{Result, SnapshotError};
use tracing::info;

use crate::registry::TableRegistry;
use crate::storage::config::StorageConfig;

// ============================================================================
// Defaults
// ============================================================================

/// Region used when neither `AWS_REGION` nor the shared profile names one.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Top-level prefix of every snapshot object key.
pub const DEFAULT_SNAPSHOT_DATABASE: &str = "dynamodb";

/// Value of the `source` object metadata entry.
pub const DEFAULT_SNAPSHOT_SOURCE: &str = "dynamodb";

/// Logical table keys and their default physical names, in ingestion order.
pub const DEFAULT_TABLES: [(&str, &str); 8] = [
    ("locales", "ChinaWok-Locales"),
    ("usuarios", "ChinaWok-Usuarios"),
    ("productos", "ChinaWok-Productos"),
    ("empleados", "ChinaWok-Empleados"),
    ("combos", "ChinaWok-Combos"),
    ("pedidos", "ChinaWok-Pedidos"),
    ("ofertas", "ChinaWok-Ofertas"),
    ("resenas", "ChinaWok-Resenas"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Endpoint override for DynamoDB Local or LocalStack
    pub dynamodb_endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub database: String,
    pub source: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_SNAPSHOT_DATABASE.to_string(),
            source: DEFAULT_SNAPSHOT_SOURCE.to_string(),
        }
    }
}

/// Everything the ingestion core needs to build its clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub snapshot: SnapshotConfig,
    /// `(logical key, physical table)` pairs in ingestion order
    pub tables: Vec<(String, String)>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            aws: AwsConfig::default(),
            storage: StorageConfig::default(),
            snapshot: SnapshotConfig::default(),
            tables: DEFAULT_TABLES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from the environment
    ///
    /// A missing bucket is not an error here; call [`IngestConfig::validate`]
    /// to find out whether uploads can succeed.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let tables = match env::var("TABLE_REGISTRY").ok().filter(|s| !s.trim().is_empty()) {
            Some(entries) => parse_table_registry(&entries)?,
            None => DEFAULT_TABLES
                .iter()
                .map(|(key, default)| {
                    let var = format!("TABLE_{}", key.to_uppercase());
                    let physical = env::var(&var)
                        .ok()
                        .filter(|s| !s.is_empty())
                        .unwrap_or_else(|| default.to_string());
                    (key.to_string(), physical)
                })
                .collect(),
        };

        Ok(Self {
            aws: AwsConfig {
                region: non_empty_var("AWS_REGION"),
                profile: non_empty_var("AWS_PROFILE"),
                dynamodb_endpoint: non_empty_var("DYNAMODB_ENDPOINT"),
            },
            storage: StorageConfig::from_env(),
            snapshot: SnapshotConfig {
                database: non_empty_var("SNAPSHOT_DATABASE")
                    .unwrap_or_else(|| DEFAULT_SNAPSHOT_DATABASE.to_string()),
                source: non_empty_var("SNAPSHOT_SOURCE")
                    .unwrap_or_else(|| DEFAULT_SNAPSHOT_SOURCE.to_string()),
            },
            tables,
        })
    }

    /// Check that required settings are present
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.is_empty() {
            return Err(SnapshotError::Configuration(
                "S3_BUCKET_NAME is not set".to_string(),
            ));
        }

        if self.tables.is_empty() {
            return Err(SnapshotError::Configuration(
                "No tables are registered".to_string(),
            ));
        }

        Ok(())
    }

    pub fn registry(&self) -> TableRegistry {
        TableRegistry::new(self.tables.iter().cloned())
    }

    /// Resolve shared AWS configuration (region, profile, credentials)
    pub async fn load_sdk_config(&self) -> SdkConfig {
        let region = RegionProviderChain::first_try(self.aws.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_AWS_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(profile) = &self.aws.profile {
            loader = loader.profile_name(profile);
        }

        let sdk_config = loader.load().await;
        info!(region = ?sdk_config.region(), profile = ?self.aws.profile, "AWS configuration loaded");
        sdk_config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Parse `key=Physical,key2=Physical2`
fn parse_table_registry(entries: &str) -> Result<Vec<(String, String)>> {
    entries.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, physical)) if !key.trim().is_empty() && !physical.trim().is_empty() => {
                Ok((key.trim().to_string(), physical.trim().to_string()))
            },
            _ => Err(SnapshotError::Configuration(format!(
                "Invalid TABLE_REGISTRY entry '{pair}', expected key=TableName"
            ))),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_table_vars() {
        env::remove_var("TABLE_REGISTRY");
        for (key, _) in DEFAULT_TABLES {
            env::remove_var(format!("TABLE_{}", key.to_uppercase()));
        }
    }

    #[test]
    #[serial]
    fn test_default_tables_in_order() {
        clear_table_vars();

        let config = IngestConfig::from_env().unwrap();
        let registry = config.registry();

        let keys: Vec<_> = registry.keys().collect();
        assert_eq!(
            keys,
            vec!["locales", "usuarios", "productos", "empleados", "combos", "pedidos", "ofertas", "resenas"]
        );
        assert_eq!(registry.resolve("resenas").unwrap(), "ChinaWok-Resenas");
    }

    #[test]
    #[serial]
    fn test_per_table_override() {
        clear_table_vars();
        env::set_var("TABLE_PEDIDOS", "prod-pedidos");

        let config = IngestConfig::from_env().unwrap();
        env::remove_var("TABLE_PEDIDOS");

        assert_eq!(config.registry().resolve("pedidos").unwrap(), "prod-pedidos");
        assert_eq!(config.tables.len(), 8);
    }

    #[test]
    #[serial]
    fn test_table_registry_replaces_set() {
        clear_table_vars();
        env::set_var("TABLE_REGISTRY", "locales=T1, usuarios=T2");

        let config = IngestConfig::from_env().unwrap();
        env::remove_var("TABLE_REGISTRY");

        assert_eq!(
            config.tables,
            vec![
                ("locales".to_string(), "T1".to_string()),
                ("usuarios".to_string(), "T2".to_string())
            ]
        );
    }

    #[test]
    fn test_malformed_registry_entry() {
        let err = parse_table_registry("locales=T1,usuarios").unwrap_err();
        assert!(matches!(err, SnapshotError::Configuration(_)));
    }

    #[test]
    #[serial]
    fn test_snapshot_defaults() {
        env::remove_var("SNAPSHOT_DATABASE");
        env::remove_var("SNAPSHOT_SOURCE");

        let config = IngestConfig::from_env().unwrap();
        assert_eq!(config.snapshot.database, "dynamodb");
        assert_eq!(config.snapshot.source, "dynamodb");
    }

    #[test]
    fn test_validate_requires_bucket() {
        let mut config = IngestConfig::default();
        assert!(matches!(
            config.validate(),
            Err(SnapshotError::Configuration(_))
        ));

        config.storage.bucket = "chinawok-datalake".to_string();
        assert!(config.validate().is_ok());
    }
}

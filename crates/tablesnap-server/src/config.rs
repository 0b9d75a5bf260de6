//! Configuration management

use serde::{Deserialize, Serialize};
use tablesnap_ingest::config::IngestConfig;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ingest: IngestConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Missing ingestion settings are logged as warnings; the server still
    /// starts so `/health` can report what is wrong.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: std::env::var("TABLESNAP_HOST")
                    .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: std::env::var("TABLESNAP_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: std::env::var("TABLESNAP_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            ingest: IngestConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if let Err(e) = self.ingest.validate() {
            tracing::warn!("{e}. The service may not work correctly");
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_defaults() {
        std::env::remove_var("TABLESNAP_HOST");
        std::env::remove_var("TABLESNAP_PORT");

        let config = Config::load().unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.ingest.tables.len(), 8);
    }

    #[test]
    #[serial]
    fn test_load_port_override() {
        std::env::set_var("TABLESNAP_PORT", "9090");
        let config = Config::load().unwrap();
        std::env::remove_var("TABLESNAP_PORT");

        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn test_zero_port_is_rejected() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            ingest: IngestConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}

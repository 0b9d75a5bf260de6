//! Error types for tablesnap

use serde::Serialize;
use thiserror::Error;

/// Result type alias for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Main error type for snapshot ingestion
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Unknown table '{key}'. Available tables: {}", available.join(", "))]
    UnknownTable { key: String, available: Vec<String> },

    #[error("Error scanning table {table}: {message}")]
    Scan { table: String, message: String },

    #[error("Error uploading snapshot: {0}")]
    Upload(String),

    #[error("Error listing snapshots: {0}")]
    Listing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification used by transport adapters to pick a status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownTable,
    Scan,
    Upload,
    Listing,
    Configuration,
    Serialization,
}

impl SnapshotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SnapshotError::UnknownTable { .. } => ErrorKind::UnknownTable,
            SnapshotError::Scan { .. } => ErrorKind::Scan,
            SnapshotError::Upload(_) => ErrorKind::Upload,
            SnapshotError::Listing(_) => ErrorKind::Listing,
            SnapshotError::Configuration(_) => ErrorKind::Configuration,
            SnapshotError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// Whether the failure was caused by bad caller input rather than a backend
    pub fn is_caller_error(&self) -> bool {
        matches!(self, SnapshotError::UnknownTable { .. })
    }
}

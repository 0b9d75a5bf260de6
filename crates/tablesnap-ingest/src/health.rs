//! Backend reachability

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Status of a single backend, serialized as `healthy` or `unhealthy: <cause>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Healthy,
    Unhealthy(String),
}

impl BackendStatus {
    pub fn from_probe(result: anyhow::Result<()>) -> Self {
        match result {
            Ok(()) => BackendStatus::Healthy,
            Err(e) => BackendStatus::Unhealthy(format!("{e:#}")),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, BackendStatus::Healthy)
    }
}

impl Serialize for BackendStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BackendStatus::Healthy => serializer.serialize_str("healthy"),
            BackendStatus::Unhealthy(cause) => {
                serializer.serialize_str(&format!("unhealthy: {cause}"))
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub dynamodb: BackendStatus,
    pub s3: BackendStatus,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.dynamodb.is_healthy() && self.s3.is_healthy()
    }
}

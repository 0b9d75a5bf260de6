//! Run timestamp source

use chrono::{DateTime, Utc};

/// Second-resolution stamp used in snapshot file names (`YYYYMMDD_HHMMSS`)
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Supplies "now" to the writer and orchestrator so runs can be pinned in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Format a run timestamp for object names and reports
pub fn run_stamp(at: DateTime<Utc>) -> String {
    at.format(RUN_TIMESTAMP_FORMAT).to_string()
}

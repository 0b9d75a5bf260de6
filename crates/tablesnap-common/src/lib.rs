//! tablesnap Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging for the tablesnap workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`SnapshotError`] taxonomy shared by the ingestion
//!   core and both transport adapters
//! - **Logging**: a single `tracing` subscriber initializer driven by environment
//!
//! # Example
//!
//! ```no_run
//! use tablesnap_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ErrorKind, Result, SnapshotError};

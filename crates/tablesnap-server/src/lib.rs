//! tablesnap Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP adapter over the ingestion core: on-demand single-table and
//! all-tables snapshots, backend health, and snapshot listing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablesnap_ingest::IngestOrchestrator;
//! use tablesnap_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator = Arc::new(IngestOrchestrator::from_config(&config.ingest).await);
//!     let app = api::create_router(api::AppState { orchestrator });
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;

// Re-export commonly used types
pub use error::AppError;

//! Snapshot writer
//!
//! Serializes a batch of normalized records into one object under a
//! date-partitioned key and uploads it with provenance metadata:
//!
//! ```text
//! <database>/<table>/year=YYYY/month=MM/day=DD/<table>_<YYYYMMDD_HHMMSS>[_array].json
//! ```
//!
//! Two encodings are supported. [`SnapshotFormat::JsonLines`] writes one
//! object per line and is what the query engine reads; [`SnapshotFormat::JsonArray`]
//! writes a single indented array for humans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::ser::{Formatter, PrettyFormatter};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use tablesnap_common::{Result, SnapshotError};
use tracing::{info, instrument};

use crate::clock::{run_stamp, Clock};
use crate::storage::{location, ObjectStore, PutObjectRequest, StoredObject};
use crate::value::Record;

pub const CONTENT_TYPE: &str = "application/json";

/// Output encoding for a snapshot object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotFormat {
    /// One JSON object per line, no enclosing array
    #[default]
    #[serde(alias = "jsonl", alias = "lines")]
    JsonLines,
    /// A single JSON array indented by two spaces
    #[serde(alias = "array")]
    JsonArray,
}

impl SnapshotFormat {
    /// File name suffix placed before `.json`
    pub fn suffix(&self) -> &'static str {
        match self {
            SnapshotFormat::JsonLines => "",
            SnapshotFormat::JsonArray => "_array",
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotFormat::JsonLines => write!(f, "jsonl"),
            SnapshotFormat::JsonArray => write!(f, "array"),
        }
    }
}

impl FromStr for SnapshotFormat {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "jsonl" | "lines" | "json_lines" => Ok(SnapshotFormat::JsonLines),
            "array" | "json_array" => Ok(SnapshotFormat::JsonArray),
            other => Err(SnapshotError::Configuration(format!(
                "Invalid snapshot format: {other}. Expected one of: jsonl, array"
            ))),
        }
    }
}

/// Partitioned object key for one table's snapshot
pub fn object_key(
    database: &str,
    table: &str,
    run_at: DateTime<Utc>,
    format: SnapshotFormat,
) -> String {
    format!(
        "{database}/{table}/{partition}/{table}_{stamp}{suffix}.json",
        partition = run_at.format("year=%Y/month=%m/day=%d"),
        stamp = run_stamp(run_at),
        suffix = format.suffix(),
    )
}

/// Compact JSON with a space after every `,` and `:`
///
/// Keeps line-delimited output byte-compatible with files produced by the
/// earlier ingestion jobs.
#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode records in the requested format
///
/// Text is written as UTF-8 without escaping non-ASCII characters.
pub fn encode(records: &[Record], format: SnapshotFormat) -> Result<Vec<u8>> {
    match format {
        SnapshotFormat::JsonLines => {
            let mut out = Vec::new();
            for (i, record) in records.iter().enumerate() {
                if i > 0 {
                    out.push(b'\n');
                }
                let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
                record.serialize(&mut ser)?;
            }
            Ok(out)
        },
        SnapshotFormat::JsonArray => {
            let mut out = Vec::new();
            let mut ser = serde_json::Serializer::with_formatter(
                &mut out,
                PrettyFormatter::with_indent(b"  "),
            );
            records.serialize(&mut ser)?;
            Ok(out)
        },
    }
}

/// Uploads encoded snapshots to the object store
pub struct SnapshotWriter {
    store: Arc<dyn ObjectStore>,
    source: String,
    clock: Arc<dyn Clock>,
}

impl SnapshotWriter {
    pub fn new(store: Arc<dyn ObjectStore>, source: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            source: source.into(),
            clock,
        }
    }

    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Encode `records` and upload them under the partition for `run_at`
    ///
    /// Returns the `s3://bucket/key` location of the new object.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn write(
        &self,
        records: &[Record],
        database: &str,
        table: &str,
        format: SnapshotFormat,
        run_at: DateTime<Utc>,
    ) -> Result<String> {
        let bucket = self.store.bucket();
        if bucket.is_empty() {
            return Err(SnapshotError::Configuration(
                "S3_BUCKET_NAME is not configured".to_string(),
            ));
        }

        let key = object_key(database, table, run_at, format);
        let body = encode(records, format)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), self.source.clone());
        metadata.insert("table".to_string(), table.to_string());
        metadata.insert("record_count".to_string(), records.len().to_string());
        metadata.insert(
            "extraction_timestamp".to_string(),
            self.clock.now().to_rfc3339(),
        );

        let uploaded = self
            .store
            .put_object(PutObjectRequest {
                key,
                body,
                content_type: CONTENT_TYPE.to_string(),
                metadata,
                encrypt: true,
            })
            .await
            .map_err(|e| SnapshotError::Upload(format!("{e:#}")))?;

        let location = location(bucket, &uploaded.key);
        info!(
            table = %table,
            format = %format,
            bytes = uploaded.size,
            checksum = %uploaded.checksum,
            location = %location,
            "Snapshot uploaded"
        );

        Ok(location)
    }

    /// Objects already written under `prefix`
    pub async fn list_snapshots(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        self.store
            .list_objects(prefix)
            .await
            .map_err(|e| SnapshotError::Listing(format!("{e:#}")))
    }
}

//! Logical table key registry
//!
//! Maps the short keys callers use ("locales", "pedidos", ...) to physical
//! DynamoDB table names. The set is closed and comes from configuration;
//! iteration follows registration order.

use tablesnap_common::{Result, SnapshotError};

/// A registered table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub key: String,
    pub physical_name: String,
}

/// Case-insensitive, ordered table key registry
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    entries: Vec<TableEntry>,
}

impl TableRegistry {
    /// Build a registry from `(key, physical name)` pairs
    ///
    /// Keys are stored lowercase. A key registered twice keeps its first
    /// position and takes the later physical name.
    pub fn new<I, K, V>(tables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut registry = Self::default();
        for (key, physical_name) in tables {
            registry.register(key, physical_name);
        }
        registry
    }

    fn register(&mut self, key: impl Into<String>, physical_name: impl Into<String>) {
        let key = key.into().trim().to_lowercase();
        let physical_name = physical_name.into();

        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => existing.physical_name = physical_name,
            None => self.entries.push(TableEntry { key, physical_name }),
        }
    }

    /// Resolve a logical key to its physical table name
    pub fn resolve(&self, key: &str) -> Result<&str> {
        self.entry(key).map(|e| e.physical_name.as_str())
    }

    /// Look up the full entry for a logical key
    pub fn entry(&self, key: &str) -> Result<&TableEntry> {
        let wanted = key.trim().to_lowercase();
        self.entries
            .iter()
            .find(|e| e.key == wanted)
            .ok_or_else(|| SnapshotError::UnknownTable {
                key: key.to_string(),
                available: self.keys().map(str::to_string).collect(),
            })
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

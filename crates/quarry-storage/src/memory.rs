//! In-memory datastores.
//!
//! Used for tests and for small deployments where records already live in
//! process memory. Each store also records the lookups it served so callers
//! can check what the adapters asked for.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use quarry_core::{RecordId, Result};
use serde_json::Value;

use crate::datastore::{EmbeddedStore, KeyValueStore, RelationalStore, SelectStatement};
use crate::record::Row;

// ============================================================================
// MemoryTables
// ============================================================================

/// Relational store over in-memory tables.
///
/// Rows are returned in the order of the requested identifiers.
#[derive(Debug, Default)]
pub struct MemoryTables {
    tables: RwLock<HashMap<String, Vec<Row>>>,
    default_table: Option<String>,
    executed: Mutex<Vec<String>>,
}

impl MemoryTables {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the store to a table, the way a model handle is.
    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = Some(table.into());
        self
    }

    /// Insert a row. Non-object values are ignored.
    pub fn insert(&self, table: &str, row: Value) {
        if let Value::Object(row) = row {
            self.tables
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(table.to_string())
                .or_default()
                .push(row);
        }
    }

    /// SQL of every statement executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RelationalStore for MemoryTables {
    fn fetch(&self, statement: &SelectStatement) -> Result<Vec<Row>> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(statement.to_sql());

        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let Some(rows) = tables.get(&statement.table) else {
            return Ok(Vec::new());
        };

        let rows = statement
            .ids
            .iter()
            .filter_map(|id| {
                rows.iter().find(|row| {
                    row.get(&statement.id_column)
                        .and_then(RecordId::from_value)
                        .is_some_and(|row_id| &row_id == id)
                })
            })
            .map(|row| project(row, &statement.columns))
            .collect();
        Ok(rows)
    }

    fn default_table(&self) -> Option<&str> {
        self.default_table.as_deref()
    }
}

fn project(row: &Row, columns: &[String]) -> Row {
    if columns.is_empty() {
        return row.clone();
    }
    columns
        .iter()
        .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
        .collect()
}

// ============================================================================
// MemoryKeyValue
// ============================================================================

/// Key-value store over a hash map.
#[derive(Debug, Default)]
pub struct MemoryKeyValue {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MemoryKeyValue {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `key`.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), payload.into());
    }

    /// Store a JSON-serialized value under `key`.
    pub fn insert_json(&self, key: impl Into<String>, value: &Value) {
        self.insert(key, value.to_string().into_bytes());
    }

    /// Keys of every multi-get served so far, one entry per call.
    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl KeyValueStore for MemoryKeyValue {
    fn get_multi(&self, keys: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(keys.to_vec());
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }
}

// ============================================================================
// MemoryEmbedded
// ============================================================================

/// Embedded store over a hash map.
#[derive(Debug, Default)]
pub struct MemoryEmbedded {
    entries: RwLock<HashMap<String, Vec<u8>>>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryEmbedded {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under `key`.
    pub fn insert(&self, key: impl Into<String>, payload: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), payload.into());
    }

    /// Every key looked up so far.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EmbeddedStore for MemoryEmbedded {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_tables_orders_by_request() {
        let store = MemoryTables::new();
        store.insert("things", json!({"id": 1, "name": "one"}));
        store.insert("things", json!({"id": 2, "name": "two"}));
        store.insert("things", json!({"id": 3, "name": "three"}));

        let statement = SelectStatement::new("things", vec![RecordId::Int(3), RecordId::Int(1)]);
        let rows = store.fetch(&statement).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("three"), json!("one")]);
        assert_eq!(store.executed().len(), 1);
    }

    #[test]
    fn test_memory_tables_projects_columns() {
        let store = MemoryTables::new();
        store.insert("things", json!({"id": 1, "name": "one", "size": 9}));
        let statement = SelectStatement::new("things", vec![RecordId::Int(1)])
            .with_columns(vec!["name".to_string()]);
        let rows = store.fetch(&statement).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["name"], json!("one"));
    }

    #[test]
    fn test_memory_tables_unknown_table() {
        let store = MemoryTables::new();
        let rows = store
            .fetch(&SelectStatement::new("nothing", vec![RecordId::Int(1)]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_memory_key_value_skips_missing() {
        let store = MemoryKeyValue::new();
        store.insert("a", b"1".to_vec());
        let found = store
            .get_multi(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(found, vec![("a".to_string(), b"1".to_vec())]);
        assert_eq!(store.requests().len(), 1);
    }

    #[test]
    fn test_memory_embedded_records_lookups() {
        let store = MemoryEmbedded::new();
        store.insert("k1", b"v".to_vec());
        assert_eq!(store.get("k1").unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("k2").unwrap(), None);
        assert_eq!(store.lookups(), vec!["k1".to_string(), "k2".to_string()]);
    }
}

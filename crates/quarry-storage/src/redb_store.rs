//! Embedded store backed by a redb database file.
//!
//! Records live in a single `records` table keyed by the prefixed
//! identifier. This module is only available with the `embedded-redb`
//! feature.

use std::path::Path;

use quarry_core::{Error, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};

use crate::datastore::EmbeddedStore;

const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// A redb database opened as an [`EmbeddedStore`].
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open an existing database file.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::open(path).map_err(|e| {
            Error::storage_with_source(format!("failed to open {}", path.display()), e)
        })?;
        Ok(Self { db })
    }

    /// Create (or open) a database file.
    pub fn create(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|e| {
            Error::storage_with_source(format!("failed to create {}", path.display()), e)
        })?;
        Ok(Self { db })
    }

    /// Store a payload under `key`.
    pub fn insert(&self, key: &str, payload: &[u8]) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| Error::storage_with_source("failed to begin write", e))?;
        {
            let mut table = txn
                .open_table(RECORDS)
                .map_err(|e| Error::storage_with_source("failed to open records table", e))?;
            table
                .insert(key, payload)
                .map_err(|e| Error::storage_with_source(format!("failed to write '{key}'"), e))?;
        }
        txn.commit()
            .map_err(|e| Error::storage_with_source("failed to commit", e))
    }
}

impl EmbeddedStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| Error::storage_with_source("failed to begin read", e))?;
        let table = match txn.open_table(RECORDS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(Error::storage_with_source("failed to open records table", e)),
        };
        let value = table
            .get(key)
            .map_err(|e| Error::storage_with_source(format!("failed to read '{key}'"), e))?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::adapter::{HydrationRequest, StorageAdapter};
    use crate::adapters::EmbeddedAdapter;
    use crate::datastore::Datastore;
    use quarry_core::RecordId;
    use serde_json::json;

    #[test]
    fn test_get_missing_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::create(&dir.path().join("empty.redb")).unwrap();
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_adapter_opens_redb_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venues.redb");
        {
            let store = RedbStore::create(&path).unwrap();
            store
                .insert("venue:1", json!({"name": "Hall"}).to_string().as_bytes())
                .unwrap();
        }

        let mut adapter = EmbeddedAdapter::new();
        adapter
            .connect(Datastore::Location(path.to_string_lossy().into_owned()))
            .unwrap();
        let ids = [RecordId::Int(1)];
        let records = adapter
            .query(&HydrationRequest::new(&ids).with_key_prefix("venue:"))
            .unwrap();
        assert_eq!(records[0].attribute("name").unwrap(), json!("Hall"));
    }
}

//! Relational adapters.

use std::sync::Arc;

use quarry_core::{Error, Result};

use super::not_connected;
use crate::adapter::{HydrationRequest, StorageAdapter};
use crate::datastore::{Datastore, RelationalStore, SelectStatement};
use crate::record::Record;

/// Dataset-style relational adapter.
///
/// Resolves identifiers with `SELECT * FROM table WHERE id IN (...)`. The
/// table comes from the search, or from a model-bound handle's default.
#[derive(Default)]
pub struct RelationalAdapter {
    store: Option<Arc<dyn RelationalStore>>,
}

impl RelationalAdapter {
    /// Create an unconnected adapter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for RelationalAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelationalAdapter")
            .field("connected", &self.store.is_some())
            .finish()
    }
}

impl StorageAdapter for RelationalAdapter {
    fn name(&self) -> &str {
        "sequel"
    }

    fn connect(&mut self, datastore: Datastore) -> Result<()> {
        self.store = Some(relational_handle(self.name(), datastore)?);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    fn query(&self, request: &HydrationRequest<'_>) -> Result<Vec<Record>> {
        let store = self.store.as_ref().ok_or_else(|| not_connected(self.name()))?;
        fetch_records(self.name(), store.as_ref(), request, Vec::new())
    }
}

/// Model-style relational adapter.
///
/// Like [`RelationalAdapter`], but honours the request's column list so
/// only the selected attributes are loaded.
#[derive(Default)]
pub struct OrmAdapter {
    store: Option<Arc<dyn RelationalStore>>,
}

impl OrmAdapter {
    /// Create an unconnected adapter.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for OrmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrmAdapter")
            .field("connected", &self.store.is_some())
            .finish()
    }
}

impl StorageAdapter for OrmAdapter {
    fn name(&self) -> &str {
        "orm"
    }

    fn connect(&mut self, datastore: Datastore) -> Result<()> {
        self.store = Some(relational_handle(self.name(), datastore)?);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    fn query(&self, request: &HydrationRequest<'_>) -> Result<Vec<Record>> {
        let store = self.store.as_ref().ok_or_else(|| not_connected(self.name()))?;
        fetch_records(self.name(), store.as_ref(), request, request.columns.to_vec())
    }
}

fn relational_handle(adapter: &str, datastore: Datastore) -> Result<Arc<dyn RelationalStore>> {
    match datastore {
        Datastore::Relational(store) => Ok(store),
        other => Err(Error::invalid_datastore(
            adapter,
            "relational",
            other.kind_name(),
        )),
    }
}

fn fetch_records(
    adapter: &str,
    store: &dyn RelationalStore,
    request: &HydrationRequest<'_>,
    columns: Vec<String>,
) -> Result<Vec<Record>> {
    let table = request
        .table
        .or_else(|| store.default_table())
        .ok_or_else(|| Error::InvalidTable {
            adapter: adapter.to_string(),
        })?;
    if request.ids.is_empty() {
        return Ok(Vec::new());
    }

    let statement = SelectStatement::new(table, request.ids.to_vec()).with_columns(columns);
    log::debug!("{adapter}: {}", statement.to_sql());
    let rows = store.fetch(&statement)?;
    Ok(rows.into_iter().map(Record::Row).collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::datastore::Datastore;
    use crate::memory::{MemoryKeyValue, MemoryTables};
    use quarry_core::RecordId;
    use serde_json::json;

    fn store() -> Arc<MemoryTables> {
        let store = MemoryTables::new().with_default_table("things");
        store.insert("things", json!({"id": 1, "name": "one", "size": 1}));
        store.insert("things", json!({"id": 2, "name": "two", "size": 2}));
        Arc::new(store)
    }

    #[test]
    fn test_relational_rejects_other_handles() {
        let mut adapter = RelationalAdapter::new();
        let err = adapter
            .connect(Datastore::key_value(MemoryKeyValue::new()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDatastore { .. }));
        assert!(!adapter.is_connected());

        let err = adapter
            .connect(Datastore::Location("postgres://localhost/db".into()))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDatastore { found, .. } if found == "location"));
    }

    #[test]
    fn test_relational_query_uses_where_in() {
        let store = store();
        let mut adapter = RelationalAdapter::new();
        adapter.connect(Datastore::Relational(store.clone())).unwrap();

        let ids = [RecordId::Int(2), RecordId::Int(1)];
        let records = adapter
            .query(&HydrationRequest::new(&ids).with_table(Some("things")))
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attribute("name").unwrap(), json!("two"));
        assert_eq!(
            store.executed(),
            vec!["SELECT * FROM \"things\" WHERE \"id\" IN (2, 1)".to_string()]
        );
    }

    #[test]
    fn test_relational_falls_back_to_default_table() {
        let mut adapter = RelationalAdapter::new();
        adapter.connect(Datastore::Relational(store())).unwrap();
        let ids = [RecordId::Int(1)];
        let records = adapter.query(&HydrationRequest::new(&ids)).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_relational_requires_a_table() {
        let mut adapter = RelationalAdapter::new();
        adapter
            .connect(Datastore::relational(MemoryTables::new()))
            .unwrap();
        let ids = [RecordId::Int(1)];
        let err = adapter.query(&HydrationRequest::new(&ids)).unwrap_err();
        assert!(matches!(err, Error::InvalidTable { .. }));
    }

    #[test]
    fn test_relational_unconnected_query_fails() {
        let adapter = RelationalAdapter::new();
        let ids = [RecordId::Int(1)];
        assert!(adapter.query(&HydrationRequest::new(&ids)).is_err());
    }

    #[test]
    fn test_empty_ids_skip_the_store() {
        let store = store();
        let mut adapter = RelationalAdapter::new();
        adapter.connect(Datastore::Relational(store.clone())).unwrap();
        let records = adapter.query(&HydrationRequest::new(&[])).unwrap();
        assert!(records.is_empty());
        assert!(store.executed().is_empty());
    }

    #[test]
    fn test_orm_honours_select_list() {
        let store = store();
        let mut adapter = OrmAdapter::new();
        adapter.connect(Datastore::Relational(store.clone())).unwrap();

        let ids = [RecordId::Int(1)];
        let columns = vec!["name".to_string()];
        let records = adapter
            .query(&HydrationRequest::new(&ids).with_columns(&columns))
            .unwrap();
        assert_eq!(records[0].attribute("name").unwrap(), json!("one"));
        assert_eq!(records[0].attribute("size").unwrap(), serde_json::Value::Null);
        assert_eq!(
            store.executed(),
            vec!["SELECT \"name\" FROM \"things\" WHERE \"id\" IN (1)".to_string()]
        );
    }
}

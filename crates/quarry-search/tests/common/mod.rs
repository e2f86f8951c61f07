//! Shared fixtures for quarry-search integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use quarry_core::Settings;
use quarry_search::{RecordingConnector, SearchConfiguration};
use quarry_storage::{Datastore, MemoryKeyValue, MemoryTables};
use serde_json::json;

/// Key-value store holding `{1: "a", 2: "b", 3: "c"}` under bare keys.
pub fn letters() -> Arc<MemoryKeyValue> {
    let store = Arc::new(MemoryKeyValue::new());
    for (id, letter) in [(1, "a"), (2, "b"), (3, "c")] {
        store.insert_json(id.to_string(), &json!(letter));
    }
    store
}

/// Relational tables of venues and events.
pub fn venue_tables() -> Arc<MemoryTables> {
    let tables = Arc::new(MemoryTables::new());
    tables.insert("venues", json!({"id": 1, "name": "Town Hall", "city": "Leeds"}));
    tables.insert("venues", json!({"id": 2, "name": "Corn Exchange", "city": "Leeds"}));
    tables.insert("events", json!({"id": 10, "name": "Quartet", "venue_id": 1}));
    tables.insert("events", json!({"id": 11, "name": "Choir", "venue_id": 2}));
    tables
}

/// Configuration over default settings with `connector` installed.
pub fn configuration(connector: &RecordingConnector) -> SearchConfiguration {
    let mut config = SearchConfiguration::from_settings(&Settings::default());
    config.set_connector(Arc::new(connector.clone()));
    config
}

/// Key-value configuration searching `things_idx` over `store`.
pub fn things(connector: &RecordingConnector, store: Arc<MemoryKeyValue>) -> SearchConfiguration {
    let mut config = configuration(connector);
    config
        .set_adapter("key-value")
        .unwrap()
        .datastore(Datastore::KeyValue(store))
        .unwrap()
        .index("things")
        .unwrap();
    config
}

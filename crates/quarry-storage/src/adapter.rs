//! Storage adapter trait and factory.
//!
//! This module defines the `StorageAdapter` trait every backend satisfies,
//! plus the factory that builds an adapter from its registered name.
//!
//! # Adapters
//!
//! - `RelationalAdapter`: `WHERE id IN (...)` over a table handle
//! - `OrmAdapter`: relational lookup restricted to a select list
//! - `KeyValueAdapter`: prefixed multi-get with payload decoding
//! - `EmbeddedAdapter`: prefixed point lookups with payload decoding
//! - `NullAdapter`: always empty
//! - `UnimplementedAdapter`: fails on every operation
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{AdapterKind, RecordId};
//! use quarry_storage::{create_adapter, Datastore, HydrationRequest, MemoryKeyValue};
//! use serde_json::json;
//!
//! let store = MemoryKeyValue::new();
//! store.insert_json("thing:1", &json!({"name": "one"}));
//!
//! let mut adapter = create_adapter(AdapterKind::KeyValue).unwrap();
//! adapter.connect(Datastore::key_value(store)).unwrap();
//!
//! let ids = [RecordId::Int(1)];
//! let records = adapter
//!     .query(&HydrationRequest::new(&ids).with_key_prefix("thing:"))
//!     .unwrap();
//! assert_eq!(records.len(), 1);
//! ```

use std::fmt;

use quarry_core::{AdapterKind, RecordId, Result};
use serde_json::Value;

use crate::adapters::{
    EmbeddedAdapter, KeyValueAdapter, OrmAdapter, RelationalAdapter, UnimplementedAdapter,
};
use crate::datastore::Datastore;
use crate::record::Record;

/// Everything an adapter needs to resolve one table's identifiers.
#[derive(Debug, Clone, Copy)]
pub struct HydrationRequest<'a> {
    /// Deduplicated identifiers, in first-seen order.
    pub ids: &'a [RecordId],
    /// Table or collection to read, when the search names one.
    pub table: Option<&'a str>,
    /// Prefix prepended to each identifier by key-addressed stores.
    pub key_prefix: &'a str,
    /// Columns to return; empty means everything.
    pub columns: &'a [String],
}

impl<'a> HydrationRequest<'a> {
    /// Request for `ids` with no table, prefix, or column restriction.
    pub fn new(ids: &'a [RecordId]) -> Self {
        Self {
            ids,
            table: None,
            key_prefix: "",
            columns: &[],
        }
    }

    /// Name the table to read.
    pub fn with_table(mut self, table: Option<&'a str>) -> Self {
        self.table = table;
        self
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, key_prefix: &'a str) -> Self {
        self.key_prefix = key_prefix;
        self
    }

    /// Restrict the returned columns.
    pub fn with_columns(mut self, columns: &'a [String]) -> Self {
        self.columns = columns;
        self
    }

    /// Identifiers with the key prefix applied.
    pub fn prefixed_keys(&self) -> Vec<String> {
        self.ids
            .iter()
            .map(|id| format!("{}{id}", self.key_prefix))
            .collect()
    }
}

/// Resolves external identifiers into full records.
///
/// Implementations are synchronous: each call is one round trip to the
/// backend and runs to completion before returning.
pub trait StorageAdapter: fmt::Debug + Send + Sync {
    /// Adapter name for diagnostics.
    fn name(&self) -> &str;

    /// Bind to a datastore handle.
    ///
    /// Fails with `InvalidDatastore` when the handle is not the kind this
    /// adapter works with.
    fn connect(&mut self, datastore: Datastore) -> Result<()>;

    /// Whether a datastore is bound.
    fn is_connected(&self) -> bool;

    /// Resolve identifiers to records.
    fn query(&self, request: &HydrationRequest<'_>) -> Result<Vec<Record>>;

    /// Read a named attribute from a record this adapter returned.
    fn get_attribute(&self, record: &Record, name: &str) -> Result<Value> {
        record.attribute(name)
    }
}

/// Build the adapter registered under `kind`.
///
/// Returns `None` for [`AdapterKind::None`]. The adapter is not connected.
pub fn create_adapter(kind: AdapterKind) -> Option<Box<dyn StorageAdapter>> {
    let adapter: Box<dyn StorageAdapter> = match kind {
        AdapterKind::Sequel => Box::new(RelationalAdapter::new()),
        AdapterKind::Orm => Box::new(OrmAdapter::new()),
        AdapterKind::KeyValue => Box::new(KeyValueAdapter::new()),
        AdapterKind::EmbeddedDb => Box::new(EmbeddedAdapter::new()),
        AdapterKind::DocumentMapper | AdapterKind::Berkeley => {
            Box::new(UnimplementedAdapter::new(kind))
        }
        AdapterKind::None => return None,
    };
    Some(adapter)
}

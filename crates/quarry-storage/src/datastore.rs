//! Datastore handles and the backend contracts they satisfy.
//!
//! A [`Datastore`] is resolved once, when an adapter connects, into the
//! handle kind that adapter needs. Adapters never re-inspect the handle per
//! query.

use std::fmt;
use std::sync::Arc;

use quarry_core::{RecordId, Result};

use crate::record::Row;

// ============================================================================
// Backend contracts
// ============================================================================

/// A relational connection or model-bound table handle.
pub trait RelationalStore: Send + Sync {
    /// Execute a select and return the matching rows.
    fn fetch(&self, statement: &SelectStatement) -> Result<Vec<Row>>;

    /// Table a model-bound handle reads from when the search names none.
    fn default_table(&self) -> Option<&str> {
        None
    }
}

/// A key-value store with multi-get.
pub trait KeyValueStore: Send + Sync {
    /// Fetch several keys at once.
    ///
    /// Returns the `(key, payload)` pairs that exist, in request order.
    fn get_multi(&self, keys: &[String]) -> Result<Vec<(String, Vec<u8>)>>;
}

/// An embedded database offering point lookups of serialized records.
pub trait EmbeddedStore: Send + Sync {
    /// Fetch a single key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

// ============================================================================
// Datastore
// ============================================================================

/// A concrete handle an adapter can be bound to.
#[derive(Clone)]
pub enum Datastore {
    /// Relational connection or table handle.
    Relational(Arc<dyn RelationalStore>),
    /// Key-value store handle.
    KeyValue(Arc<dyn KeyValueStore>),
    /// Embedded database handle.
    Embedded(Arc<dyn EmbeddedStore>),
    /// Connection string or file path, opened by the adapter at connect time.
    Location(String),
}

impl Datastore {
    /// Handle kind, for diagnostics and error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datastore::Relational(_) => "relational",
            Datastore::KeyValue(_) => "key-value",
            Datastore::Embedded(_) => "embedded",
            Datastore::Location(_) => "location",
        }
    }

    /// Wrap a relational store.
    pub fn relational<S: RelationalStore + 'static>(store: S) -> Self {
        Datastore::Relational(Arc::new(store))
    }

    /// Wrap a key-value store.
    pub fn key_value<S: KeyValueStore + 'static>(store: S) -> Self {
        Datastore::KeyValue(Arc::new(store))
    }

    /// Wrap an embedded store.
    pub fn embedded<S: EmbeddedStore + 'static>(store: S) -> Self {
        Datastore::Embedded(Arc::new(store))
    }
}

impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datastore::Location(location) => f.debug_tuple("Location").field(location).finish(),
            other => write!(f, "Datastore({})", other.kind_name()),
        }
    }
}

// ============================================================================
// SelectStatement
// ============================================================================

/// A `SELECT ... WHERE id IN (...)` lookup handed to relational stores.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Table to read.
    pub table: String,
    /// Columns to return; empty means all columns.
    pub columns: Vec<String>,
    /// Identifier column.
    pub id_column: String,
    /// Identifiers to match.
    pub ids: Vec<RecordId>,
}

impl SelectStatement {
    /// Select all columns of `table` whose `id` is one of `ids`.
    pub fn new(table: impl Into<String>, ids: Vec<RecordId>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            id_column: "id".to_string(),
            ids,
        }
    }

    /// Restrict the returned columns.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    /// Render as SQL with inline, quoted literals.
    pub fn to_sql(&self) -> String {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|c| quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let ids = self
            .ids
            .iter()
            .map(|id| match id {
                RecordId::Int(i) => i.to_string(),
                RecordId::Str(s) => format!("'{}'", s.replace('\'', "''")),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {columns} FROM {} WHERE {} IN ({ids})",
            quote_identifier(&self.table),
            quote_identifier(&self.id_column)
        )
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

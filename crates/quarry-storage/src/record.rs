//! Hydrated records and attribute access.
//!
//! Backends return very different things: relational rows, deserialized
//! documents, raw bytes, or domain objects with accessors. [`Record`] wraps
//! them all, and [`Record::attribute`] is the single contract the search
//! pipeline relies on when projecting attributes.

use std::fmt;
use std::sync::Arc;

use quarry_core::{Error, Result};
use serde_json::{Map, Value};

/// A relational row: column name to value.
pub type Row = Map<String, Value>;

/// A domain object exposing named attribute accessors.
pub trait Entity: fmt::Debug + Send + Sync {
    /// Read a named attribute, or `None` if the entity has no such accessor.
    fn attribute(&self, name: &str) -> Option<Value>;
}

/// One record resolved from a storage backend.
#[derive(Debug, Clone)]
pub enum Record {
    /// A relational row (keyed access).
    Row(Row),
    /// A deserialized document (keyed access for objects, indexed for arrays).
    Value(Value),
    /// Bytes that could not be deserialized.
    Raw(Vec<u8>),
    /// A domain object (named accessors).
    Entity(Arc<dyn Entity>),
}

impl Record {
    /// Read the named attribute.
    ///
    /// Entities are asked through their accessors; rows and objects by key;
    /// arrays by numeric index. A keyed record without the key yields `null`.
    /// Anything else fails with [`Error::InscrutableRecord`].
    pub fn attribute(&self, name: &str) -> Result<Value> {
        let found = match self {
            Record::Entity(entity) => entity.attribute(name),
            Record::Row(row) => Some(row.get(name).cloned().unwrap_or(Value::Null)),
            Record::Value(Value::Object(map)) => {
                Some(map.get(name).cloned().unwrap_or(Value::Null))
            }
            Record::Value(Value::Array(items)) => name
                .parse::<usize>()
                .ok()
                .map(|i| items.get(i).cloned().unwrap_or(Value::Null)),
            Record::Value(_) | Record::Raw(_) => None,
        };
        found.ok_or_else(|| Error::InscrutableRecord {
            attribute: name.to_string(),
            record: self.describe(),
        })
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Record::Row(row) => format!("row with {} columns", row.len()),
            Record::Value(value) => {
                let text = value.to_string();
                if text.chars().count() > 64 {
                    let mut short: String = text.chars().take(61).collect();
                    short.push_str("...");
                    short
                } else {
                    text
                }
            }
            Record::Raw(bytes) => format!("{} raw bytes", bytes.len()),
            Record::Entity(entity) => format!("{entity:?}"),
        }
    }

    /// Decode a stored payload: JSON when possible, raw bytes otherwise.
    ///
    /// Never fails; undecodable payloads are kept verbatim.
    pub fn decode(bytes: Vec<u8>) -> Self {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Record::Value(value),
            Err(e) => {
                log::warn!("Keeping {} undecodable bytes as a raw record: {e}", bytes.len());
                Record::Raw(bytes)
            }
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Record::Row(a), Record::Row(b)) => a == b,
            (Record::Value(a), Record::Value(b)) => a == b,
            (Record::Raw(a), Record::Raw(b)) => a == b,
            (Record::Entity(a), Record::Entity(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Record::Value(value)
    }
}

impl From<&str> for Record {
    fn from(value: &str) -> Self {
        Record::Value(Value::from(value))
    }
}

impl From<Row> for Record {
    fn from(row: Row) -> Self {
        Record::Row(row)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Names of the storage adapters Quarry knows how to build.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A registered storage adapter.
///
/// `None` is a valid choice: it clears any adapter and datastore handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// Relational dataset adapter (`WHERE id IN (...)` over a table handle).
    Sequel,
    /// Relational model adapter honouring a select list.
    Orm,
    /// Key-value store with key prefixes and multi-get.
    KeyValue,
    /// Embedded database with point lookups of serialized records.
    EmbeddedDb,
    /// Document mapper; registered but not implemented.
    DocumentMapper,
    /// Berkeley-style store; registered but not implemented.
    Berkeley,
    /// No adapter.
    None,
}

impl AdapterKind {
    /// Every accepted kind, in registry order.
    pub const ALL: [AdapterKind; 7] = [
        AdapterKind::Sequel,
        AdapterKind::Orm,
        AdapterKind::KeyValue,
        AdapterKind::EmbeddedDb,
        AdapterKind::DocumentMapper,
        AdapterKind::Berkeley,
        AdapterKind::None,
    ];

    /// Canonical registry name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Sequel => "sequel",
            AdapterKind::Orm => "orm",
            AdapterKind::KeyValue => "key-value",
            AdapterKind::EmbeddedDb => "embedded-db",
            AdapterKind::DocumentMapper => "document-mapper",
            AdapterKind::Berkeley => "berkeley",
            AdapterKind::None => "none",
        }
    }

    /// Comma-separated list of accepted names, for error messages.
    pub fn allowed() -> String {
        Self::ALL
            .iter()
            .map(AdapterKind::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "sequel" | "sequel-like" | "relational" => Ok(AdapterKind::Sequel),
            "orm" | "orm-like" | "active-record" => Ok(AdapterKind::Orm),
            "key-value" | "kv" | "memcache" => Ok(AdapterKind::KeyValue),
            "embedded-db" | "embedded" | "tokyo-cabinet" => Ok(AdapterKind::EmbeddedDb),
            "document-mapper" | "datamapper" => Ok(AdapterKind::DocumentMapper),
            "berkeley" => Ok(AdapterKind::Berkeley),
            "none" => Ok(AdapterKind::None),
            _ => Err(Error::InvalidAdapterName {
                name: s.to_string(),
                allowed: Self::allowed(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("sequel".parse::<AdapterKind>().unwrap(), AdapterKind::Sequel);
        assert_eq!("active_record".parse::<AdapterKind>().unwrap(), AdapterKind::Orm);
        assert_eq!("memcache".parse::<AdapterKind>().unwrap(), AdapterKind::KeyValue);
        assert_eq!(
            "tokyo_cabinet".parse::<AdapterKind>().unwrap(),
            AdapterKind::EmbeddedDb
        );
        assert_eq!("none".parse::<AdapterKind>().unwrap(), AdapterKind::None);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "skull_of_orm".parse::<AdapterKind>().unwrap_err();
        assert!(matches!(err, Error::InvalidAdapterName { .. }));
        assert!(err.to_string().contains("key-value"));
    }

    #[test]
    fn test_display_roundtrip() {
        for kind in AdapterKind::ALL {
            assert_eq!(kind.to_string().parse::<AdapterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&AdapterKind::EmbeddedDb).unwrap();
        assert_eq!(json, "\"embedded-db\"");
    }
}

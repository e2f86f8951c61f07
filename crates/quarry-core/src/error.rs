//! Error types for Quarry.
//!
//! Every crate in the workspace returns [`Result`]. Errors fall into three
//! families, reported by [`Error::kind`]:
//!
//! - configuration errors, raised while a configuration is being assembled
//! - builder-input errors, raised by the chained call that received bad input
//! - execution errors, raised by a terminal call
//!
//! Nothing in Quarry retries or recovers locally; every error surfaces to
//! the caller.

use std::path::{Path, PathBuf};

/// Result type alias for Quarry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The family an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raised synchronously while configuring a search.
    Configuration,
    /// Raised by a builder call before any network round trip.
    BuilderInput,
    /// Raised during a terminal call.
    Execution,
}

/// Errors that can occur while configuring or running a search.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The adapter name is not one of the registered adapters.
    #[error("Invalid adapter type '{name}'! Allowable adapters are {allowed}.")]
    InvalidAdapterName {
        /// Name that was requested
        name: String,
        /// Comma-separated list of accepted names
        allowed: String,
    },

    /// A datastore was supplied before an adapter was chosen.
    #[error("No adapter has been chosen; pick one before connecting a datastore")]
    AdapterNotSet,

    /// A terminal call was made without an index-server connector.
    #[error("No index-server connector has been configured")]
    ConnectorNotSet,

    /// A single-resource configuration was given a second table.
    #[error("A single-resource configuration can only search one table (tried to add '{table}')")]
    TooManyTables {
        /// Table that was rejected
        table: String,
    },

    /// An index was declared without a table while several tables exist.
    #[error("Index '{index}' must name the table it belongs to")]
    AmbiguousIndex {
        /// Canonical index name
        index: String,
    },

    /// Filter values were not a set, a numeric range, or a numeric bound.
    #[error("Invalid filter on '{attribute}': {reason}")]
    InvalidFilter {
        /// Attribute being filtered
        attribute: String,
        /// What was wrong with the values
        reason: String,
    },

    /// Unknown distance unit.
    #[error("\"{unit}\" is not a supported distance unit")]
    InvalidUnits {
        /// Unit that was requested
        unit: String,
    },

    /// Unknown fragment-matching scheme.
    #[error("\"{scheme}\" is not a supported fragment matching scheme")]
    InvalidFragmentMatchingScheme {
        /// Scheme that was requested
        scheme: String,
    },

    /// Unknown match mode.
    #[error("\"{mode}\" is not a supported match mode")]
    InvalidMatchMode {
        /// Mode that was requested
        mode: String,
    },

    /// Unknown sort mode.
    #[error("\"{mode}\" is not a supported sort mode")]
    InvalidSortMode {
        /// Mode that was requested
        mode: String,
    },

    /// Unknown group-by function.
    #[error("\"{function}\" is not a supported group function")]
    InvalidGroupFunction {
        /// Function that was requested
        function: String,
    },

    /// A value could not be read as a latitude/longitude pair.
    #[error("{input} doesn't seem to be a geometry-enabled object")]
    InvalidPoint {
        /// Rendering of the rejected input
        input: String,
    },

    /// The index server returned no response for a query.
    #[error("The index server rejected the query on '{indexes}'; perhaps an index does not exist?")]
    InvalidIndexQuery {
        /// Comma-joined index list that was queried
        indexes: String,
    },

    /// Attribute projection was requested over several tables.
    #[error("Results span multiple tables ({tables}); attributes are ambiguous")]
    MultipleResultSets {
        /// Comma-joined table names
        tables: String,
    },

    /// A record offers neither named nor keyed attribute access.
    #[error("Cannot read attribute '{attribute}' from record {record}")]
    InscrutableRecord {
        /// Attribute that was requested
        attribute: String,
        /// Short description of the record
        record: String,
    },

    /// An adapter was connected to a handle of the wrong kind.
    #[error("The {adapter} adapter cannot use a {found} datastore (expected {expected})")]
    InvalidDatastore {
        /// Adapter name
        adapter: String,
        /// Handle kind the adapter needs
        expected: String,
        /// Handle kind (or location) that was given
        found: String,
    },

    /// A relational lookup had no table to read from.
    #[error("No table is available for the {adapter} adapter")]
    InvalidTable {
        /// Adapter name
        adapter: String,
    },

    /// The adapter exists in the registry but has no implementation.
    #[error("The {adapter} adapter is not implemented")]
    AdapterUnimplemented {
        /// Adapter name
        adapter: String,
    },

    /// The index-server client failed.
    #[error("Index server error: {message}")]
    Client {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Classify this error into its family.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAdapterName { .. }
            | Error::AdapterNotSet
            | Error::ConnectorNotSet
            | Error::TooManyTables { .. }
            | Error::AmbiguousIndex { .. }
            | Error::Config { .. }
            | Error::Io { .. }
            | Error::Toml(_) => ErrorKind::Configuration,
            Error::InvalidFilter { .. }
            | Error::InvalidUnits { .. }
            | Error::InvalidFragmentMatchingScheme { .. }
            | Error::InvalidMatchMode { .. }
            | Error::InvalidSortMode { .. }
            | Error::InvalidGroupFunction { .. }
            | Error::InvalidPoint { .. } => ErrorKind::BuilderInput,
            Error::InvalidIndexQuery { .. }
            | Error::MultipleResultSets { .. }
            | Error::InscrutableRecord { .. }
            | Error::InvalidDatastore { .. }
            | Error::InvalidTable { .. }
            | Error::AdapterUnimplemented { .. }
            | Error::Client { .. }
            | Error::Storage { .. }
            | Error::Serialization(_) => ErrorKind::Execution,
        }
    }

    /// Returns whether this error is retryable.
    ///
    /// Quarry performs no retries and treats every failure as final.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates an I/O error naming the file involved.
    pub fn io_with_path(err: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source: err,
        }
    }

    /// Creates a new index-server client error.
    pub fn client<S: Into<String>>(message: S) -> Self {
        Error::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new index-server client error with a source error.
    pub fn client_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Client {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new storage error.
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Error::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source error.
    pub fn storage_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new filter error.
    pub fn invalid_filter<A, R>(attribute: A, reason: R) -> Self
    where
        A: Into<String>,
        R: Into<String>,
    {
        Error::InvalidFilter {
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    /// Creates a datastore mismatch error.
    pub fn invalid_datastore(adapter: &str, expected: &str, found: &str) -> Self {
        Error::InvalidDatastore {
            adapter: adapter.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_filter("score", "expected a set or a range");
        assert_eq!(
            err.to_string(),
            "Invalid filter on 'score': expected a set or a range"
        );
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::AdapterNotSet.kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::AmbiguousIndex {
                index: "things_idx".to_string()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            Error::InvalidUnits {
                unit: "furlongs".to_string()
            }
            .kind(),
            ErrorKind::BuilderInput
        );
        assert_eq!(
            Error::InvalidIndexQuery {
                indexes: "missing_idx".to_string()
            }
            .kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            Error::invalid_datastore("sequel", "relational", "key-value").kind(),
            ErrorKind::Execution
        );
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!Error::client("connection refused").is_retryable());
        assert!(!Error::storage("timeout").is_retryable());
        assert!(!Error::AdapterNotSet.is_retryable());
    }

    #[test]
    fn test_client_error_with_source() {
        let io_error = std::io::Error::other("network failure");
        let err = Error::client_with_source("query failed", io_error);
        assert!(err.to_string().contains("query failed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_io_with_path_keeps_source() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::io_with_path(io_error, Path::new("/etc/quarry.toml"));
        assert_eq!(err.to_string(), "I/O error on /etc/quarry.toml: missing");
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let source = std::error::Error::source(&err).unwrap();
        let source = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_datastore_display() {
        let err = Error::invalid_datastore("sequel", "relational", "key-value");
        assert_eq!(
            err.to_string(),
            "The sequel adapter cannot use a key-value datastore (expected relational)"
        );
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }

    #[test]
    fn test_serde_error_is_execution() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let err: Error = serde_err.into();
        assert_eq!(err.kind(), ErrorKind::Execution);
    }
}

//! # quarry-search
//!
//! Fluent search builder for Quarry.
//!
//! A search runs in two phases. The index server is queried first and
//! returns matches carrying a target attribute (the record identifier).
//! Those identifiers are then resolved into full records by a storage
//! adapter.
//!
//! ```text
//! SearchConfiguration ──► Search ──► QueryPlan
//!                                       │
//!                      IndexConnector ──┤ phase 1: ClientCalls + query
//!                                       │
//!                      StorageAdapter ──┘ phase 2: hydrate ids
//!                                       │
//!                                       ▼
//!                                   ResultSet
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use quarry_core::Settings;
//! use quarry_search::{RecordingConnector, ResultSet, Search, SearchConfiguration};
//! use quarry_storage::{Datastore, MemoryKeyValue, Record};
//! use serde_json::json;
//!
//! let store = MemoryKeyValue::new();
//! store.insert_json("1", &json!("a"));
//! store.insert_json("2", &json!("b"));
//!
//! let connector =
//!     RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[2, 1, 2]);
//!
//! let mut config = SearchConfiguration::from_settings(&Settings::default());
//! config
//!     .set_connector(Arc::new(connector))
//!     .set_adapter("key-value")?
//!     .datastore(Datastore::key_value(store))?
//!     .index("things")?;
//!
//! let results = Search::new(&config).for_terms(["x"]).filter("score", 1..=5)?.run()?;
//! assert_eq!(
//!     results,
//!     ResultSet::Records(vec![Record::from(json!("b")), Record::from(json!("a"))])
//! );
//! # Ok::<(), quarry_core::Error>(())
//! ```

#![forbid(unsafe_code)]

pub mod binding;
pub mod client;
pub mod config;
pub mod filter;
pub mod fragment;
pub mod geo;
pub mod recording;
pub mod results;
pub mod search;

// Re-exports
pub use binding::{SearchFactory, bind, bind_resource};
pub use client::{
    ClientCall, GroupFunction, IndexClient, IndexConnector, IndexMatch, IndexResponse, MatchMode,
    SortMode,
};
pub use config::{ConfigurationMode, SearchConfiguration, TableIndexes, TableOptions};
pub use filter::{FilterKind, FilterSpec, FilterValues, IntoFilterValues};
pub use fragment::FragmentMode;
pub use geo::GeoDistanceBuilder;
pub use recording::RecordingConnector;
pub use results::{MatchCount, ResultSet, collect_ids};
pub use search::{PlannedQuery, QueryGroup, QueryPlan, Search, SearchOverrides};

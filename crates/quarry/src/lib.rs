//! Quarry umbrella crate.
//!
//! This crate re-exports all Quarry components for convenience.
//! Use feature flags to enable the optional storage backends.

#![doc = include_str!("../README.md")]

pub use quarry_core as core;
pub use quarry_search as search;
pub use quarry_storage as storage;

/// The types most searches need.
pub mod prelude {
    pub use quarry_core::{
        AdapterKind, AngleUnit, DistanceUnit, Error, LatLng, RecordId, Result, Settings,
        ToLatLng,
    };
    pub use quarry_search::{
        FragmentMode, GroupFunction, IndexConnector, MatchCount, MatchMode, RecordingConnector,
        ResultSet, Search, SearchConfiguration, SearchFactory, SortMode, bind, bind_resource,
    };
    pub use quarry_storage::{
        Datastore, Entity, MemoryEmbedded, MemoryKeyValue, MemoryTables, Record, StorageAdapter,
    };
}

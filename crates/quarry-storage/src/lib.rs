//! # quarry-storage
//!
//! Storage adapters for Quarry.
//!
//! After the index server returns matches, the search pipeline hands the
//! matched identifiers to a [`StorageAdapter`], which resolves them into full
//! [`Record`]s from whatever backend holds them.
//!
//! # Features
//!
//! - `embedded-redb`: open `.redb` files as embedded datastores
//! - `kv-redis`: open `redis://` URLs as key-value datastores
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      quarry-storage                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  StorageAdapter trait                                       │
//! │  ├── RelationalAdapter (SELECT ... WHERE id IN (...))       │
//! │  ├── OrmAdapter (select-list aware)                         │
//! │  ├── KeyValueAdapter (prefixed multi-get)                   │
//! │  ├── EmbeddedAdapter (prefixed point lookups)               │
//! │  ├── NullAdapter (always empty)                             │
//! │  └── UnimplementedAdapter (fails loudly)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Datastore (handle kinds resolved at connect time)          │
//! │  ├── RelationalStore · KeyValueStore · EmbeddedStore        │
//! │  └── Memory* implementations, RedbStore, RedisStore         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Record / Entity (attribute access contract)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]

pub mod adapter;
pub mod adapters;
pub mod datastore;
pub mod memory;
pub mod record;

#[cfg(feature = "embedded-redb")]
pub mod redb_store;

#[cfg(feature = "kv-redis")]
pub mod redis_store;

// Re-exports
pub use adapter::{HydrationRequest, StorageAdapter, create_adapter};
pub use adapters::{
    EmbeddedAdapter, KeyValueAdapter, NullAdapter, OrmAdapter, RelationalAdapter,
    UnimplementedAdapter,
};
pub use datastore::{Datastore, EmbeddedStore, KeyValueStore, RelationalStore, SelectStatement};
pub use memory::{MemoryEmbedded, MemoryKeyValue, MemoryTables};
pub use record::{Entity, Record, Row};

#[cfg(feature = "embedded-redb")]
pub use redb_store::RedbStore;

#[cfg(feature = "kv-redis")]
pub use redis_store::RedisStore;

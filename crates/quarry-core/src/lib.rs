//! Quarry Core: shared types, errors, settings, and utilities.
//!
//! This crate provides the foundational types used across all Quarry crates.
//! It has no internal Quarry dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types, the error taxonomy, and the Result alias
//! - [`settings`]: Process-wide defaults with `init`/`reset` lifecycle
//! - [`index`]: Index-name canonicalization
//! - [`geo`]: Distance units, angle conventions, point resolution
//! - [`adapter`]: Registry of storage adapter names
//! - [`ids`]: External record identifiers

#![forbid(unsafe_code)]

pub mod adapter;
pub mod error;
pub mod geo;
pub mod ids;
pub mod index;
pub mod settings;

// Re-export key types at crate root for convenience
pub use adapter::AdapterKind;
pub use error::{Error, ErrorKind, Result};
pub use geo::{AngleUnit, DistanceUnit, LatLng, ToLatLng};
pub use ids::RecordId;
pub use index::{canonicalize, canonicalize_with};
pub use settings::{ServerAddress, Settings};

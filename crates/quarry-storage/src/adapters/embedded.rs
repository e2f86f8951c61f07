//! Embedded database adapter.

use std::path::Path;
use std::sync::Arc;

use quarry_core::{Error, Result};

use super::not_connected;
use crate::adapter::{HydrationRequest, StorageAdapter};
use crate::datastore::{Datastore, EmbeddedStore};
use crate::record::Record;

/// Adapter for embedded databases.
///
/// Each identifier is prefixed and looked up on its own; payloads are
/// decoded as JSON with a raw-bytes fallback. Missing keys are skipped.
///
/// A [`Datastore::Location`] must name an existing database file. With the
/// `embedded-redb` feature, `.redb` files are opened directly.
#[derive(Default)]
pub struct EmbeddedAdapter {
    store: Option<Arc<dyn EmbeddedStore>>,
}

impl EmbeddedAdapter {
    /// Create an unconnected adapter.
    pub fn new() -> Self {
        Self::default()
    }

    fn open_location(&self, location: &str) -> Result<Arc<dyn EmbeddedStore>> {
        let path = Path::new(location);
        if !path.exists() {
            return Err(Error::invalid_datastore(
                self.name(),
                "an existing database file",
                &format!("missing file '{location}'"),
            ));
        }
        #[cfg(feature = "embedded-redb")]
        {
            if path.extension().is_some_and(|ext| ext == "redb") {
                return Ok(Arc::new(crate::redb_store::RedbStore::open(path)?));
            }
        }
        Err(Error::invalid_datastore(
            self.name(),
            "a supported database file",
            &format!("file '{location}'"),
        ))
    }
}

impl std::fmt::Debug for EmbeddedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedAdapter")
            .field("connected", &self.store.is_some())
            .finish()
    }
}

impl StorageAdapter for EmbeddedAdapter {
    fn name(&self) -> &str {
        "embedded-db"
    }

    fn connect(&mut self, datastore: Datastore) -> Result<()> {
        let store = match datastore {
            Datastore::Embedded(store) => store,
            Datastore::Location(location) => self.open_location(&location)?,
            other => {
                return Err(Error::invalid_datastore(
                    self.name(),
                    "embedded",
                    other.kind_name(),
                ));
            }
        };
        self.store = Some(store);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    fn query(&self, request: &HydrationRequest<'_>) -> Result<Vec<Record>> {
        let store = self.store.as_ref().ok_or_else(|| not_connected(self.name()))?;
        let mut records = Vec::with_capacity(request.ids.len());
        for key in request.prefixed_keys() {
            if let Some(payload) = store.get(&key)? {
                records.push(Record::decode(payload));
            }
        }
        Ok(records)
    }
}

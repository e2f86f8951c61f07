//! Key-value adapter.

use std::sync::Arc;

use quarry_core::{Error, Result};

use super::not_connected;
use crate::adapter::{HydrationRequest, StorageAdapter};
use crate::datastore::{Datastore, KeyValueStore};
use crate::record::Record;

/// Adapter for key-value stores.
///
/// Identifiers are prefixed with the request's key prefix and fetched in a
/// single multi-get. Payloads are decoded as JSON; anything else is kept as
/// raw bytes. Missing keys are skipped.
#[derive(Default)]
pub struct KeyValueAdapter {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl KeyValueAdapter {
    /// Create an unconnected adapter.
    pub fn new() -> Self {
        Self::default()
    }

    fn open_location(&self, location: &str) -> Result<Arc<dyn KeyValueStore>> {
        #[cfg(feature = "kv-redis")]
        {
            if location.starts_with("redis://") || location.starts_with("rediss://") {
                return Ok(Arc::new(crate::redis_store::RedisStore::open(location)?));
            }
        }
        Err(Error::invalid_datastore(
            self.name(),
            "key-value",
            &format!("location '{location}'"),
        ))
    }
}

impl std::fmt::Debug for KeyValueAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValueAdapter")
            .field("connected", &self.store.is_some())
            .finish()
    }
}

impl StorageAdapter for KeyValueAdapter {
    fn name(&self) -> &str {
        "key-value"
    }

    fn connect(&mut self, datastore: Datastore) -> Result<()> {
        let store = match datastore {
            Datastore::KeyValue(store) => store,
            Datastore::Location(location) => self.open_location(&location)?,
            other => {
                return Err(Error::invalid_datastore(
                    self.name(),
                    "key-value",
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
        if request.ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys = request.prefixed_keys();
        log::debug!("{}: multi-get of {} keys", self.name(), keys.len());
        let found = store.get_multi(&keys)?;
        Ok(found
            .into_iter()
            .map(|(_, payload)| Record::decode(payload))
            .collect())
    }
}

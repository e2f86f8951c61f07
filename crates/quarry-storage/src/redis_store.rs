//! Key-value store backed by a Redis server.
//!
//! Uses a single synchronous connection and `MGET` for multi-gets. This
//! module is only available with the `kv-redis` feature.

use std::sync::{Mutex, PoisonError};

use quarry_core::{Error, Result};

use crate::datastore::KeyValueStore;

/// A Redis connection used as a [`KeyValueStore`].
pub struct RedisStore {
    connection: Mutex<redis::Connection>,
}

impl RedisStore {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1/`).
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::storage_with_source(format!("invalid redis url '{url}'"), e))?;
        let connection = client
            .get_connection()
            .map_err(|e| Error::storage_with_source(format!("failed to connect to '{url}'"), e))?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

impl KeyValueStore for RedisStore {
    fn get_multi(&self, keys: &[String]) -> Result<Vec<(String, Vec<u8>)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
            .arg(keys.to_vec())
            .query(&mut *connection)
            .map_err(|e| Error::storage_with_source("MGET failed", e))?;
        Ok(keys
            .iter()
            .cloned()
            .zip(values)
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_bad_url() {
        let err = RedisStore::open("not a url").unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }
}

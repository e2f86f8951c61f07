//! Null and unimplemented adapters.

use quarry_core::{AdapterKind, Error, Result};

use crate::adapter::{HydrationRequest, StorageAdapter};
use crate::datastore::Datastore;
use crate::record::Record;

/// Adapter that resolves every request to nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAdapter;

impl StorageAdapter for NullAdapter {
    fn name(&self) -> &str {
        "null"
    }

    fn connect(&mut self, _datastore: Datastore) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn query(&self, _request: &HydrationRequest<'_>) -> Result<Vec<Record>> {
        Ok(Vec::new())
    }
}

/// Adapter that is registered but not implemented.
///
/// Every operation fails with [`Error::AdapterUnimplemented`].
#[derive(Debug, Clone, Copy)]
pub struct UnimplementedAdapter {
    kind: AdapterKind,
}

impl UnimplementedAdapter {
    /// Create a failing adapter for `kind`.
    pub fn new(kind: AdapterKind) -> Self {
        Self { kind }
    }

    fn unimplemented(&self) -> Error {
        Error::AdapterUnimplemented {
            adapter: self.kind.to_string(),
        }
    }
}

impl StorageAdapter for UnimplementedAdapter {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn connect(&mut self, _datastore: Datastore) -> Result<()> {
        Err(self.unimplemented())
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn query(&self, _request: &HydrationRequest<'_>) -> Result<Vec<Record>> {
        Err(self.unimplemented())
    }

    fn get_attribute(&self, _record: &Record, _name: &str) -> Result<serde_json::Value> {
        Err(self.unimplemented())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::memory::MemoryKeyValue;
    use quarry_core::RecordId;

    #[test]
    fn test_null_adapter_is_empty() {
        let mut adapter = NullAdapter;
        adapter
            .connect(Datastore::key_value(MemoryKeyValue::new()))
            .unwrap();
        let ids = [RecordId::Int(1), RecordId::Int(2)];
        assert!(adapter.query(&HydrationRequest::new(&ids)).unwrap().is_empty());
    }

    #[test]
    fn test_unimplemented_fails_everywhere() {
        let mut adapter = UnimplementedAdapter::new(AdapterKind::Berkeley);
        let ids = [RecordId::Int(1)];
        assert!(matches!(
            adapter.connect(Datastore::key_value(MemoryKeyValue::new())),
            Err(Error::AdapterUnimplemented { .. })
        ));
        assert!(matches!(
            adapter.query(&HydrationRequest::new(&ids)),
            Err(Error::AdapterUnimplemented { .. })
        ));
        let err = adapter
            .get_attribute(&Record::from("x"), "name")
            .unwrap_err();
        assert_eq!(err.to_string(), "The berkeley adapter is not implemented");
    }
}

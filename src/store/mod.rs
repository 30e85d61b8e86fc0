//! Key-value storage for key records.
//!
//! The manager only needs point lookups by key string plus one atomic
//! conditional replace used to bind a HWID exactly once.

pub mod file;
pub mod memory;
pub mod record;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::KeyRecord;

use crate::config::{StoreConfig, DEFAULT_NAMESPACE};
use crate::KeywardenError;
use std::sync::Arc;

/// Storage backend for key records.
pub trait KeyStore: Send + Sync {
    /// Load the record stored under `key`.
    fn get(&self, key: &str) -> Result<Option<KeyRecord>, KeywardenError>;

    /// Insert or overwrite the record under `record.key`.
    fn put(&self, record: &KeyRecord) -> Result<(), KeywardenError>;

    /// Remove the record under `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KeywardenError>;

    /// Atomically overwrite the stored record with `updated` if it still
    /// equals `expected`.
    ///
    /// Returns `false` without writing when the stored record changed or was
    /// removed since `expected` was read.
    fn replace(&self, expected: &KeyRecord, updated: &KeyRecord) -> Result<bool, KeywardenError>;
}

/// Open the store described by `config`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn KeyStore>, KeywardenError> {
    let store: Arc<dyn KeyStore> = match config {
        StoreConfig::Memory => Arc::new(MemoryStore::new()),
        StoreConfig::File(Some(dir)) => Arc::new(FileStore::with_path(dir.clone())?),
        StoreConfig::File(None) => Arc::new(FileStore::new(DEFAULT_NAMESPACE)?),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_memory_store() {
        let store = open_store(&StoreConfig::Memory).unwrap();
        store.put(&KeyRecord::new("K".into(), None, 0, 60)).unwrap();
        assert!(store.get("K").unwrap().is_some());
    }

    #[test]
    fn test_open_file_store_at_path() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("records");
        let store = open_store(&StoreConfig::File(Some(dir.clone()))).unwrap();

        store.put(&KeyRecord::new("K".into(), None, 0, 60)).unwrap();
        assert!(dir.join(format!("{}.json", file::hash_key("K"))).exists());
    }
}

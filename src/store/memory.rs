//! In-process store backed by a `HashMap`.

use super::{KeyRecord, KeyStore};
use crate::KeywardenError;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Volatile store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, KeyRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: PoisonError<T>) -> KeywardenError {
    KeywardenError::StoreIO("memory store lock poisoned".to_string())
}

impl KeyStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<KeyRecord>, KeywardenError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(key).cloned())
    }

    fn put(&self, record: &KeyRecord) -> Result<(), KeywardenError> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.insert(record.key.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KeywardenError> {
        let mut records = self.records.write().map_err(poisoned)?;
        records.remove(key);
        Ok(())
    }

    fn replace(&self, expected: &KeyRecord, updated: &KeyRecord) -> Result<bool, KeywardenError> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records.get_mut(&expected.key) {
            Some(current) if current == expected => {
                *current = updated.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(key: &str) -> KeyRecord {
        KeyRecord::new(key.to_string(), None, 1_000, 60)
    }

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.put(&record("a")).unwrap();
        assert_eq!(store.get("a").unwrap(), Some(record("a")));
        assert_eq!(store.len(), 1);

        store.delete("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        assert!(store.delete("nope").is_ok());
    }

    #[test]
    fn test_replace_matching() {
        let store = MemoryStore::new();
        let original = record("a");
        store.put(&original).unwrap();

        let bound = original.bound_to("HW-1");
        assert!(store.replace(&original, &bound).unwrap());
        assert_eq!(store.get("a").unwrap(), Some(bound));
    }

    #[test]
    fn test_replace_stale_expected() {
        let store = MemoryStore::new();
        let original = record("a");
        store.put(&original).unwrap();
        store.put(&original.bound_to("HW-1")).unwrap();

        assert!(!store.replace(&original, &original.bound_to("HW-2")).unwrap());
        assert_eq!(
            store.get("a").unwrap().unwrap().hwid.as_deref(),
            Some("HW-1")
        );
    }

    #[test]
    fn test_replace_missing_record() {
        let store = MemoryStore::new();
        let original = record("a");
        assert!(!store.replace(&original, &original.bound_to("HW-1")).unwrap());
        assert!(store.get("a").unwrap().is_none());
    }
}

//! File-based store with atomic writes.
//!
//! Stores one JSON record per key under `dirs::data_dir()/<namespace>/keys/`
//! by default. File names are the hex SHA-256 of the key so raw keys never
//! appear on disk outside the record body. Writes use temp file + rename.
//!
//! All mutations go through one mutex, which makes [`KeyStore::replace`]
//! atomic within a process. Several processes sharing a directory are not
//! coordinated.

use super::{KeyRecord, KeyStore};
use crate::KeywardenError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// File-based store backend.
pub struct FileStore {
    /// Directory holding record files.
    dir: PathBuf,

    /// Serializes writers.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store under `dirs::data_dir()/<namespace>/keys/`.
    pub fn new(namespace: &str) -> Result<Self, KeywardenError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| KeywardenError::StoreIO("Could not find data directory".to_string()))?;

        Self::with_path(base_dir.join(namespace).join("keys"))
    }

    /// Create a store at a specific directory.
    pub fn with_path(dir: PathBuf) -> Result<Self, KeywardenError> {
        fs::create_dir_all(&dir)
            .map_err(|e| KeywardenError::StoreIO(format!("Failed to create store dir: {}", e)))?;

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", hash_key(key)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, KeywardenError> {
        self.write_lock
            .lock()
            .map_err(|_| KeywardenError::StoreIO("file store lock poisoned".to_string()))
    }

    fn read_record(&self, key: &str) -> Result<Option<KeyRecord>, KeywardenError> {
        let path = self.record_path(key);

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(KeywardenError::StoreIO(format!(
                    "Failed to read record file: {}",
                    e
                )))
            }
        };

        KeyRecord::from_json(&json).map(Some)
    }

    fn write_record(&self, record: &KeyRecord) -> Result<(), KeywardenError> {
        let hash = hash_key(&record.key);
        let target_path = self.dir.join(format!("{}.json", hash));
        let temp_path = self.dir.join(format!("{}.tmp", hash));

        let json = record.to_json()?;

        fs::write(&temp_path, &json)
            .map_err(|e| KeywardenError::StoreIO(format!("Failed to write temp file: {}", e)))?;

        fs::rename(&temp_path, &target_path)
            .map_err(|e| KeywardenError::StoreIO(format!("Failed to rename record file: {}", e)))?;

        Ok(())
    }

    /// Remove every record file.
    pub fn clear(&self) -> Result<(), KeywardenError> {
        let _guard = self.lock()?;

        for entry in fs::read_dir(&self.dir)
            .map_err(|e| KeywardenError::StoreIO(format!("Failed to read store dir: {}", e)))?
        {
            let entry = entry
                .map_err(|e| KeywardenError::StoreIO(format!("Failed to read entry: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path)
                    .map_err(|e| KeywardenError::StoreIO(format!("Failed to delete: {}", e)))?;
            }
        }
        Ok(())
    }
}

impl KeyStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<KeyRecord>, KeywardenError> {
        self.read_record(key)
    }

    fn put(&self, record: &KeyRecord) -> Result<(), KeywardenError> {
        let _guard = self.lock()?;
        self.write_record(record)
    }

    fn delete(&self, key: &str) -> Result<(), KeywardenError> {
        let _guard = self.lock()?;

        match fs::remove_file(self.record_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(KeywardenError::StoreIO(format!(
                "Failed to delete record: {}",
                e
            ))),
        }
    }

    fn replace(&self, expected: &KeyRecord, updated: &KeyRecord) -> Result<bool, KeywardenError> {
        let _guard = self.lock()?;

        match self.read_record(&expected.key)? {
            Some(current) if current == *expected => {
                self.write_record(updated)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Compute a SHA-256 hash of the key for use as a file name.
pub fn hash_key(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(hash)
}

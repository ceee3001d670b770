// Storage module - key-value persistence collaborator

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("storage read failed for key '{key}': {source}")]
    Read {
        key: String,
        source: std::io::Error,
    },

    #[error("storage write failed for key '{key}': {source}")]
    Write {
        key: String,
        source: std::io::Error,
    },
}

/// Synchronous key-value storage. A missing key is `None`, never an error;
/// read/write failures (disk full, permissions) surface as `StorageError`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// File-backed store: one file per key under a data directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_string(),
                source: e,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Write-then-rename so readers never observe a half-written value.
        let tmp = self.dir.join(format!(".{key}.tmp"));
        let write = fs::write(&tmp, value).and_then(|_| fs::rename(&tmp, self.path_for(key)));
        write.map_err(|e| StorageError::Write {
            key: key.to_string(),
            source: e,
        })
    }
}

/// In-memory store used by tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().expect("store mutex poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().expect("store mutex poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.get("registered_pases").unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set("registered_pases", "[]").unwrap();
        assert_eq!(store.get("registered_pases").unwrap().unwrap(), "[]");

        store.set("registered_pases", "[1]").unwrap();
        assert_eq!(store.get("registered_pases").unwrap().unwrap(), "[1]");
    }

    #[test]
    fn memory_store_round_trips_values() {
        let store = MemoryStore::new();

        assert!(store.get("k").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().unwrap(), "v");
    }
}

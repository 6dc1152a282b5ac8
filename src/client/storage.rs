//! Durable key/value storage port for drafts
//!
//! Models browser-durable storage: synchronous string keys and values,
//! fallible because real backends can be full or unavailable.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Storage backend failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// String key/value storage the draft store persists into
pub trait DraftStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("k"), Ok(None));
        storage.set("k", "v".to_string()).unwrap();
        assert_eq!(storage.get("k"), Ok(Some("v".to_string())));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k"), Ok(None));
        assert!(storage.is_empty());
    }

    #[test]
    fn set_overwrites_existing_values() {
        let storage = MemoryStorage::new();
        storage.set("k", "old".to_string()).unwrap();
        storage.set("k", "new".to_string()).unwrap();
        assert_eq!(storage.get("k"), Ok(Some("new".to_string())));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn removing_a_missing_key_is_a_no_op() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.remove("absent"), Ok(()));
    }
}

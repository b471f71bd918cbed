//! In-memory storage backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::CartStorage;
use crate::error::PersistenceError;

/// Storage that lives as long as the process.
///
/// Clones share the same map, so a test can keep one handle to inspect what
/// the store wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Store a raw value, bypassing serialization (e.g., to seed bad data).
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value.into());
        }
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Backend("memory storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| PersistenceError::Backend("memory storage lock poisoned".to_string()))?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

//! In-memory `KeyValueStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use lorekeeper_core::error::DomainError;
use lorekeeper_core::storage::KeyValueStore;

/// A key-value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let values = entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Returns a copy of everything currently stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.values.lock().unwrap().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), DomainError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A store that reads nothing and fails every write.
#[derive(Debug)]
pub struct FailingStore;

impl KeyValueStore for FailingStore {
    fn load(&self, _key: &str) -> Option<String> {
        None
    }

    fn save(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Err(DomainError::Storage("disk full".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), DomainError> {
        Err(DomainError::Storage("disk full".into()))
    }
}

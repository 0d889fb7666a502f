//! Key-value persistence port for client state that survives restarts.

use crate::error::DomainError;

/// Minimal string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn load(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> Result<(), DomainError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), DomainError>;
}

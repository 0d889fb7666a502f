//! File-backed key-value store.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use lorekeeper_core::error::DomainError;
use lorekeeper_core::storage::KeyValueStore;
use tracing::{debug, warn};

/// Stores key-value pairs as one JSON object on disk.
///
/// The file is read once at construction and cached in memory; every
/// mutation rewrites it. A missing, unreadable or corrupt file is treated as
/// empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading any existing contents.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = read_entries(&path);
        debug!(path = %path.display(), entries = cache.len(), "file store opened");
        Self {
            path,
            cache: RwLock::new(cache),
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), DomainError> {
        let mut cache = self
            .cache
            .write()
            .map_err(|e| DomainError::Storage(format!("lock poisoned: {e}")))?;
        apply(&mut cache);
        let data = serde_json::to_string_pretty(&*cache)
            .map_err(|e| DomainError::Storage(format!("serialize: {e}")))?;
        drop(cache);
        self.persist(&data)
    }

    fn persist(&self, data: &str) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                DomainError::Storage(format!("create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, data)
            .map_err(|e| DomainError::Storage(format!("write {}: {e}", self.path.display())))
    }
}

fn read_entries(path: &Path) -> BTreeMap<String, String> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read state file");
            return BTreeMap::new();
        }
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to parse state file");
        BTreeMap::new()
    })
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Option<String> {
        match self.cache.read() {
            Ok(cache) => cache.get(key).cloned(),
            Err(e) => {
                warn!(error = %e, "file store lock poisoned");
                None
            }
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.mutate(|cache| {
            cache.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), DomainError> {
        self.mutate(|cache| {
            cache.remove(key);
        })
    }
}

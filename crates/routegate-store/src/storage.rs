//! String key/value storage media.
//!
//! The dashboard keeps its session markers in a flat string map, the same
//! shape as browser local storage. [`KeyValueStorage`] abstracts over where
//! that map lives, so the session store can run on an in-memory map in tests
//! and on a JSON file for a real profile.
//!
//! Every method takes `&self`: a storage is shared between concurrent
//! navigations, and each backend serializes access with its own lock. Batch
//! operations (`apply`, `snapshot`) run under one lock acquisition, which
//! is what makes a session write or clear atomic for readers.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::StoreError;

/// A flat map of string keys to string values.
pub trait KeyValueStorage: Send + Sync + 'static {
    /// Reads several keys at once, consistently.
    ///
    /// The returned vector has one entry per requested key, in order.
    fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError>;

    /// Sets `entries` and removes `removals` in one step. Readers see all
    /// of it or none of it. Removing a missing key is not an error.
    fn apply(&self, entries: &[(&str, String)], removals: &[&str]) -> Result<(), StoreError>;

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StoreError> {
        self.apply(entries, &[])
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.apply(&[], keys)
    }

    /// Reads a single key.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.snapshot(&[key])?.pop().flatten())
    }
}

/// Locks a mutex, recovering the data if a panicking thread poisoned it.
///
/// The map is always left consistent between statements, so a poisoned
/// lock carries no torn state.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read_keys(map: &BTreeMap<String, String>, keys: &[&str]) -> Vec<Option<String>> {
    keys.iter().map(|k| map.get(*k).cloned()).collect()
}

fn apply_to(map: &mut BTreeMap<String, String>, entries: &[(&str, String)], removals: &[&str]) {
    for (key, value) in entries {
        map.insert((*key).to_string(), value.clone());
    }
    for key in removals {
        map.remove(*key);
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        lock(&self.map).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.map).is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        Ok(read_keys(&lock(&self.map), keys))
    }

    fn apply(&self, entries: &[(&str, String)], removals: &[&str]) -> Result<(), StoreError> {
        apply_to(&mut lock(&self.map), entries, removals);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStorage
// ---------------------------------------------------------------------------

/// Storage persisted as a single JSON object on disk.
///
/// Nothing is cached: every read loads the file and every mutation is a
/// read-modify-write of it, so a logout through another handle (or another
/// process) on the same path is seen by the next read. Writes go to a
/// sibling temp file that is then renamed over the original, so a crash
/// mid-write leaves either the old or the new map, never half of one.
///
/// The lock only serializes handles within this process.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Opens (or prepares to create) the storage file at `path`.
    ///
    /// A missing file is an empty map. The file is not created until the
    /// first mutation.
    ///
    /// # Errors
    /// - [`StoreError::Io`] if the file exists but can't be read
    /// - [`StoreError::Corrupt`] if it isn't a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let storage = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        let map = storage.load()?;

        tracing::debug!(path = %storage.path.display(), keys = map.len(), "storage opened");
        Ok(storage)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(map).map_err(StoreError::Serialize)?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn snapshot(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError> {
        let _guard = lock(&self.lock);
        Ok(read_keys(&self.load()?, keys))
    }

    fn apply(&self, entries: &[(&str, String)], removals: &[&str]) -> Result<(), StoreError> {
        let _guard = lock(&self.lock);
        let current = self.load()?;
        let mut next = current.clone();
        apply_to(&mut next, entries, removals);
        if next == current {
            return Ok(());
        }
        self.persist(&next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_snapshot_preserves_key_order() {
        let storage = MemoryStorage::new();
        storage
            .set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();

        let values = storage.snapshot(&["b", "missing", "a"]).unwrap();

        assert_eq!(
            values,
            vec![Some("2".to_string()), None, Some("1".to_string())]
        );
    }

    #[test]
    fn test_memory_remove_many_ignores_missing_keys() {
        let storage = MemoryStorage::new();
        storage.set_many(&[("a", "1".to_string())]).unwrap();

        storage.remove_many(&["a", "never-set"]).unwrap();

        assert!(storage.is_empty());
    }

    #[test]
    fn test_get_single_key() {
        let storage = MemoryStorage::new();
        storage.set_many(&[("k", "v".to_string())]).unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(storage.get("other").unwrap(), None);
    }
}

//! KeyDir implementation
//!
//! HashMap-based index with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::KeyDirEntry;

/// In-memory index over the log
pub struct KeyDir {
    entries: RwLock<HashMap<Vec<u8>, KeyDirEntry>>,
}

impl KeyDir {
    /// Create a new empty KeyDir
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Location of the latest record for `key`, tombstones included
    pub fn get(&self, key: &[u8]) -> Option<KeyDirEntry> {
        self.entries.read().get(key).copied()
    }

    /// Point `key` at a newer record, returning the location it replaced
    pub fn set(&self, key: Vec<u8>, entry: KeyDirEntry) -> Option<KeyDirEntry> {
        self.entries.write().insert(key, entry)
    }

    /// Drop `key` from the index entirely
    ///
    /// Logical deletes never call this; they `set` a tombstone entry.
    pub fn delete(&self, key: &[u8]) -> Option<KeyDirEntry> {
        self.entries.write().remove(key)
    }

    /// All indexed keys, tombstoned ones included (arbitrary order)
    pub fn keys(&self) -> Vec<Vec<u8>> {
        self.entries.read().keys().cloned().collect()
    }

    /// Keys whose latest record is not a tombstone (arbitrary order)
    pub fn live_keys(&self) -> Vec<Vec<u8>> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| !entry.tombstone)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Snapshot of every entry (arbitrary order)
    pub fn entries(&self) -> Vec<(Vec<u8>, KeyDirEntry)> {
        self.entries
            .read()
            .iter()
            .map(|(key, entry)| (key.clone(), *entry))
            .collect()
    }

    /// Snapshot of the non-tombstoned entries (arbitrary order)
    pub fn live_entries(&self) -> Vec<(Vec<u8>, KeyDirEntry)> {
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| !entry.tombstone)
            .map(|(key, entry)| (key.clone(), *entry))
            .collect()
    }

    /// Number of indexed keys, tombstones included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Number of keys that are not tombstoned
    pub fn live_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| !entry.tombstone)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Swap in the contents of a freshly rebuilt index
    pub fn replace(&self, other: KeyDir) {
        *self.entries.write() = other.entries.into_inner();
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for KeyDir {
    fn default() -> Self {
        Self::new()
    }
}

//! MemTable implementation
//!
//! HashMap-based memtable with RwLock for concurrency.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

/// In-memory key/value map
pub struct MemTable {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,

    /// Approximate size in bytes (keys + values)
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a value by key (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Insert or replace a value (write lock)
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        let mut data = self.data.write();
        let key_len = key.len();
        let value_len = value.len();

        match data.insert(key, value) {
            Some(old) => {
                self.size.fetch_sub(old.len(), Ordering::Relaxed);
                self.size.fetch_add(value_len, Ordering::Relaxed);
            }
            None => {
                self.size.fetch_add(key_len + value_len, Ordering::Relaxed);
            }
        }
    }

    /// Remove a key (write lock)
    ///
    /// Returns true if the key was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        let mut data = self.data.write();
        match data.remove(key) {
            Some(old) => {
                self.size.fetch_sub(key.len() + old.len(), Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of every entry, in no particular order
    pub fn snapshot(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.read().clone()
    }

    /// Swap in `entries`, returning what was there before
    pub fn replace(&self, entries: HashMap<Vec<u8>, Vec<u8>>) -> HashMap<Vec<u8>, Vec<u8>> {
        let mut data = self.data.write();
        let size = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
        self.size.store(size, Ordering::Relaxed);
        std::mem::replace(&mut *data, entries)
    }

    /// Remove all entries
    pub fn clear(&self) {
        self.replace(HashMap::new());
    }

    /// Consume the table, returning its entries
    pub fn into_map(self) -> HashMap<Vec<u8>, Vec<u8>> {
        self.data.into_inner()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::errors::StorageError;
use super::storage::KeyValueStorage;

/// In-memory key-value storage, used for tests and ephemeral sessions
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-seeded with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        storage
    }

    /// Make every subsequent `put` fail, as a full or read-only medium would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `get` fail, as a missing or locked medium would
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Raw value currently held under `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().ok().and_then(|entries| entries.get(key).cloned())
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed(format!("medium unavailable reading '{}'", key)));
        }

        let entries = self.entries.lock()?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteRejected(format!("quota exceeded writing '{}'", key)));
        }

        let mut entries = self.entries.lock()?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let storage = InMemoryStorage::new();
        let clone = storage.clone();

        storage.put("k", "v").unwrap();
        assert_eq!(clone.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_failing_writes_leave_entry_untouched() {
        let storage = InMemoryStorage::with_entry("k", "old");
        storage.set_fail_writes(true);

        assert!(matches!(storage.put("k", "new"), Err(StorageError::WriteRejected(_))));
        assert_eq!(storage.raw("k").as_deref(), Some("old"));
    }

    #[test]
    fn test_failing_reads() {
        let storage = InMemoryStorage::with_entry("k", "v");
        storage.set_fail_reads(true);
        assert!(matches!(storage.get("k"), Err(StorageError::ReadFailed(_))));

        storage.set_fail_reads(false);
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}

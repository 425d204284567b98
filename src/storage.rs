use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded writing {key} ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },
    #[error("storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),
}

/// String-keyed durable storage holding serialized text values.
///
/// Mirrors the browser `localStorage` model: no types, no transactions
/// across keys, last write wins.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for &S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// Process-local storage, used by tests and as a fallback when the database
/// cannot be opened.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes of keys plus values the store accepts before writes fail.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.items
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let used = self.used_bytes_excluding(key);
            let needed = key.len() + value.len();
            if used + needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available: quota.saturating_sub(used),
                });
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips_and_removes() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("k").expect("read"), None);

        storage.set_item("k", "[1]").expect("write");
        assert_eq!(storage.get_item("k").expect("read").as_deref(), Some("[1]"));

        storage.remove_item("k").expect("remove");
        assert_eq!(storage.get_item("k").expect("read"), None);
    }

    #[test]
    fn quota_counts_existing_value_for_same_key_as_replaceable() {
        let storage = MemoryStorage::with_quota(10);
        storage.set_item("k", "12345678").expect("fits exactly");
        storage.set_item("k", "abcdefgh").expect("overwrite fits");

        let err = storage
            .set_item("other", "x")
            .expect_err("second key should exceed quota");
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(storage.get_item("k").expect("read").as_deref(), Some("abcdefgh"));
    }
}

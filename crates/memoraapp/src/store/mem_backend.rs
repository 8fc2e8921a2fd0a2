use super::backend::{check_quota, StorageBackend};
use crate::error::{MemoraError, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// In-memory storage backend.
///
/// Used by tests and as the session cache's store. Uses `RefCell` for interior
/// mutability since the store is single-threaded; this keeps the
/// `StorageBackend` trait on `&self` without locks.
#[derive(Default)]
pub struct MemBackend {
    values: RefCell<HashMap<String, String>>,
    ceiling: Option<usize>,
    simulate_write_error: RefCell<bool>,
    quota_failing_keys: RefCell<HashSet<String>>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that rejects writes once stored values exceed `ceiling` bytes.
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            ceiling: Some(ceiling),
            ..Self::default()
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Make every write to `key` fail with a quota error, regardless of size.
    pub fn fail_quota_on(&self, key: &str) {
        self.quota_failing_keys.borrow_mut().insert(key.to_string());
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    fn total_excluding(&self, key: &str) -> usize {
        self.values
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

#[async_trait(?Send)]
impl StorageBackend for MemBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(MemoraError::Store("Simulated write error".to_string()));
        }
        if self.quota_failing_keys.borrow().contains(key) {
            return Err(MemoraError::QuotaExceeded {
                key: key.to_string(),
                size: value.len(),
                ceiling: self.ceiling.unwrap_or(0),
            });
        }
        check_quota(key, self.total_excluding(key), value.len(), self.ceiling)?;
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.values.borrow_mut().clear();
        Ok(())
    }

    fn ceiling(&self) -> Option<usize> {
        self.ceiling
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let backend = MemBackend::new();
        assert_eq!(backend.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let backend = MemBackend::new();
        backend.set("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        backend.remove("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
        // Removing twice is fine
        backend.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_ceiling_counts_replacement_not_addition() {
        let backend = MemBackend::with_ceiling(10);
        backend.set("a", "12345").await.unwrap();
        backend.set("b", "12345").await.unwrap();
        // Replacing "a" with an equally sized value still fits
        backend.set("a", "abcde").await.unwrap();

        let err = backend.set("a", "abcdef").await.unwrap_err();
        assert!(err.is_quota());
        // Rejected write leaves the old value in place
        assert_eq!(backend.get("a").await.unwrap().as_deref(), Some("abcde"));
    }

    #[tokio::test]
    async fn test_fail_quota_on_single_key() {
        let backend = MemBackend::new();
        backend.fail_quota_on("bad");
        backend.set("good", "v").await.unwrap();
        let err = backend.set("bad", "v").await.unwrap_err();
        assert!(matches!(err, MemoraError::QuotaExceeded { ref key, .. } if key == "bad"));
    }

    #[tokio::test]
    async fn test_simulated_write_error_is_not_quota() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        let err = backend.set("k", "v").await.unwrap_err();
        assert!(!err.is_quota());
    }

    #[tokio::test]
    async fn test_clear() {
        let backend = MemBackend::new();
        backend.set("a", "1").await.unwrap();
        backend.set("b", "2").await.unwrap();
        backend.clear().await.unwrap();
        assert!(backend.is_empty());
    }
}

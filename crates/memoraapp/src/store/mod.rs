//! # Storage Layer
//!
//! This module defines the key-value storage abstraction. The
//! [`backend::StorageBackend`] trait is the raw I/O surface; [`KvStore`] is the
//! adapter every other part of the crate talks to.
//!
//! ## Backends
//!
//! - [`fs_backend::FsBackend`]: small synchronous store, all keys in one JSON
//!   map file (default ceiling 5 MiB).
//! - [`blob_backend::BlobBackend`]: larger asynchronous store, one file per key
//!   (default ceiling 256 MiB). Holds collections with inline images.
//! - [`mem_backend::MemBackend`]: in memory, for tests and the session cache.
//!
//! All of them sit behind one async trait, so callers await every storage call
//! whether or not the active backend actually suspends.
//!
//! ## Quota
//!
//! A write that would take a backend past its ceiling fails with
//! [`MemoraError::QuotaExceeded`] and leaves the old value untouched. That
//! error stays distinct from I/O failures so the UI can tell the user to delete
//! old data or shrink images.
//!
//! ## Legacy Migration
//!
//! A [`KvStore`] may carry a legacy backend. On a read miss in the primary
//! backend the legacy backend is consulted; a hit is copied forward into the
//! primary and served. The legacy copy stays in place unless cleanup was
//! requested when the store was built.
//!
//! ```text
//! get(key)
//!   primary hit ─────────────────────────────▶ value
//!   primary miss ─▶ legacy hit ─▶ copy forward ─▶ value
//!                                 (remove legacy copy if cleanup)
//!   primary miss ─▶ legacy miss ─────────────▶ None
//! ```
//!
//! ## Concurrency
//!
//! There is no locking. Two processes writing the same key overwrite each
//! other; the last write wins.

use crate::error::{MemoraError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

pub mod backend;
pub mod blob_backend;
pub mod fs_backend;
pub mod mem_backend;

use backend::StorageBackend;

/// The key-value adapter: uniform get/set/remove/clear over one primary
/// backend, with optional copy-forward migration from a legacy backend.
pub struct KvStore {
    primary: Box<dyn StorageBackend>,
    legacy: Option<Box<dyn StorageBackend>>,
    cleanup_legacy: bool,
}

impl KvStore {
    pub fn new(primary: impl StorageBackend + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            legacy: None,
            cleanup_legacy: false,
        }
    }

    /// Serve keys missing from the primary backend out of `legacy`, copying
    /// them forward. With `cleanup`, the legacy copy is removed once the
    /// primary holds it.
    pub fn with_legacy(mut self, legacy: impl StorageBackend + 'static, cleanup: bool) -> Self {
        self.legacy = Some(Box::new(legacy));
        self.cleanup_legacy = cleanup;
        self
    }

    /// Ceiling of the primary backend, if it has one.
    pub fn ceiling(&self) -> Option<usize> {
        self.primary.ceiling()
    }

    pub fn backend_name(&self) -> &'static str {
        self.primary.name()
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.primary.get(key).await? {
            return Ok(Some(value));
        }

        let Some(legacy) = &self.legacy else {
            return Ok(None);
        };
        let Some(value) = legacy.get(key).await? else {
            return Ok(None);
        };

        match self.primary.set(key, &value).await {
            Ok(()) => {
                debug!(
                    key,
                    from = legacy.name(),
                    to = self.primary.name(),
                    "migrated value"
                );
                if self.cleanup_legacy {
                    if let Err(e) = legacy.remove(key).await {
                        warn!(key, error = %e, "could not remove legacy copy");
                    }
                }
            }
            // Still serve the value; the next read retries the copy.
            Err(e) => warn!(key, error = %e, "could not migrate legacy value"),
        }
        Ok(Some(value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.primary.set(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.primary.remove(key).await
    }

    /// Clears the primary backend. A legacy backend is left alone.
    pub async fn clear(&self) -> Result<()> {
        self.primary.clear().await
    }

    /// Read and deserialize a JSON value.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| MemoraError::CorruptValue {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    /// Serialize and store a JSON value.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::mem_backend::MemBackend;
    use super::*;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = KvStore::new(MemBackend::new());
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_legacy_value_is_copied_forward() {
        let primary = Rc::new(MemBackend::new());
        let legacy = Rc::new(MemBackend::new());
        legacy.set("k", "old").await.unwrap();

        let store = KvStore::new(primary.clone()).with_legacy(legacy.clone(), false);

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("old"));
        assert_eq!(primary.get("k").await.unwrap().as_deref(), Some("old"));
        // Without cleanup the legacy copy stays
        assert_eq!(legacy.get("k").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_legacy_cleanup_removes_old_copy() {
        let primary = Rc::new(MemBackend::new());
        let legacy = Rc::new(MemBackend::new());
        legacy.set("k", "old").await.unwrap();

        let store = KvStore::new(primary.clone()).with_legacy(legacy.clone(), true);

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("old"));
        assert_eq!(legacy.get("k").await.unwrap(), None);
        assert_eq!(primary.get("k").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_primary_wins_over_legacy() {
        let primary = MemBackend::new();
        primary.set("k", "new").await.unwrap();
        let legacy = MemBackend::new();
        legacy.set("k", "old").await.unwrap();

        let store = KvStore::new(primary).with_legacy(legacy, false);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_failed_copy_forward_still_serves_value() {
        let primary = Rc::new(MemBackend::with_ceiling(2));
        let legacy = Rc::new(MemBackend::new());
        legacy.set("k", "too large").await.unwrap();

        let store = KvStore::new(primary.clone()).with_legacy(legacy.clone(), true);

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("too large"));
        assert_eq!(primary.get("k").await.unwrap(), None);
        // Cleanup only happens after a successful copy
        assert!(legacy.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = KvStore::new(MemBackend::new());
        store.set_json("list", &vec![1, 2, 3]).await.unwrap();
        let back: Option<Vec<i32>> = store.get_json("list").await.unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_corrupt_value_names_key() {
        let store = KvStore::new(MemBackend::new());
        store.set("list", "{not json").await.unwrap();
        let err = store.get_json::<Vec<i32>>("list").await.unwrap_err();
        assert!(matches!(err, MemoraError::CorruptValue { ref key, .. } if key == "list"));
    }

    #[tokio::test]
    async fn test_clear_leaves_legacy_alone() {
        let legacy = Rc::new(MemBackend::new());
        legacy.set("k", "old").await.unwrap();
        let store = KvStore::new(MemBackend::new()).with_legacy(legacy.clone(), false);
        store.set("other", "v").await.unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.get("other").await.unwrap(), None);
        assert!(!legacy.is_empty());
    }
}

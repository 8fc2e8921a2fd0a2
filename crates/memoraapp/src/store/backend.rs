use crate::error::{MemoraError, Result};
use async_trait::async_trait;
use std::rc::Rc;

/// Abstract interface for raw key-value I/O.
///
/// This trait handles the "how" of storage (single JSON file, one file per key,
/// memory), while [`super::KvStore`] handles the "what" (migration, typed
/// values) and the repositories own the collection rules.
///
/// Every method is `async` whether or not the backend actually suspends, so
/// callers never branch on which backend is active. Futures are not `Send`:
/// the store is driven from a single thread.
#[async_trait(?Send)]
pub trait StorageBackend {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Read the value stored under `key`.
    /// Returns Ok(None) if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    /// Fails with [`MemoraError::QuotaExceeded`] when the write would push
    /// the backend past its ceiling; nothing is written in that case.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete every key.
    async fn clear(&self) -> Result<()>;

    /// Maximum total bytes of stored values, if the backend enforces one.
    fn ceiling(&self) -> Option<usize>;
}

/// A shared handle is a backend too, so a caller can keep inspecting a backend
/// it handed to a [`super::KvStore`].
#[async_trait(?Send)]
impl<B: StorageBackend + ?Sized> StorageBackend for Rc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }

    fn ceiling(&self) -> Option<usize> {
        (**self).ceiling()
    }
}

/// Shared quota rule: the total after the write (other keys plus the new
/// value) must not exceed the ceiling.
pub(crate) fn check_quota(
    key: &str,
    others_total: usize,
    value_len: usize,
    ceiling: Option<usize>,
) -> Result<()> {
    if let Some(ceiling) = ceiling {
        let size = others_total + value_len;
        if size > ceiling {
            return Err(MemoraError::QuotaExceeded {
                key: key.to_string(),
                size,
                ceiling,
            });
        }
    }
    Ok(())
}

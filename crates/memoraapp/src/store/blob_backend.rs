use super::backend::{check_quota, StorageBackend};
use crate::error::{MemoraError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Default ceiling of the blob store, in bytes.
pub const DEFAULT_BLOB_CEILING: usize = 256 * 1024 * 1024;

const VALUE_EXT: &str = "json";

/// Large asynchronous store: one file per key, written with `tokio::fs`.
///
/// Suited to big values such as collections with inline images. The ceiling
/// counts the total size of all value files in the directory.
///
/// ## Layout
///
/// ```text
/// <root>/
/// ├── memoralink_vocab.json
/// ├── memoralink_writing_logs.json
/// └── memoralink_classical_logs.json
/// ```
pub struct BlobBackend {
    root: PathBuf,
    ceiling: Option<usize>,
}

impl BlobBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ceiling: Some(DEFAULT_BLOB_CEILING),
        }
    }

    /// Override the ceiling; `None` disables quota checks.
    pub fn with_ceiling(mut self, ceiling: Option<usize>) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Map a key to its value file. Keys are restricted to a safe character
    /// set so they can never escape the root directory.
    fn value_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(MemoraError::Store(format!("Invalid storage key: '{}'", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXT)))
    }

    /// Total size of every value file except the one for `key`.
    async fn total_excluding(&self, key: &str) -> Result<usize> {
        let skip = format!("{}.{}", key, VALUE_EXT);
        let mut total = 0usize;
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name == skip || name.starts_with('.') || !name.ends_with(VALUE_EXT) {
                continue;
            }
            let meta = entry.metadata().await?;
            if meta.is_file() {
                total += meta.len() as usize;
            }
        }
        Ok(total)
    }
}

#[async_trait(?Send)]
impl StorageBackend for BlobBackend {
    fn name(&self) -> &'static str {
        "blob"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        if self.ceiling.is_some() {
            let others = self.total_excluding(key).await?;
            check_quota(key, others, value.len(), self.ceiling)?;
        }

        fs::create_dir_all(&self.root).await?;

        // Atomic write
        let tmp_path = self.root.join(format!(".{}-{}.tmp", key, Uuid::new_v4()));
        fs::write(&tmp_path, value).await?;
        fs::rename(&tmp_path, &path).await?;
        debug!(backend = "blob", key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_value = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == VALUE_EXT);
            if is_value && entry.metadata().await?.is_file() {
                fs::remove_file(path).await?;
            }
        }
        Ok(())
    }

    fn ceiling(&self) -> Option<usize> {
        self.ceiling
    }
}

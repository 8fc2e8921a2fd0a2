use super::backend::{check_quota, StorageBackend};
use crate::error::{MemoraError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Default ceiling of the single-file store, in bytes.
pub const DEFAULT_FS_CEILING: usize = 5 * 1024 * 1024;

/// Small synchronous store: every key lives in one JSON object file.
///
/// Each operation reads the whole map and every write rewrites it, so this
/// backend suits small values. The ceiling counts the total length of all
/// stored values. I/O is blocking even though the trait is async.
pub struct FsBackend {
    root: PathBuf,
    file_name: String,
    ceiling: Option<usize>,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            file_name: "store.json".to_string(),
            ceiling: Some(DEFAULT_FS_CEILING),
        }
    }

    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = name.to_string();
        self
    }

    /// Override the ceiling; `None` disables quota checks.
    pub fn with_ceiling(mut self, ceiling: Option<usize>) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|source| MemoraError::CorruptValue {
            key: path.display().to_string(),
            source,
        })
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> Result<()> {
        self.ensure_dir(&self.root)?;
        let content = serde_json::to_string(map)?;

        // Atomic write
        let tmp_file = self.root.join(format!(".store-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content)?;
        fs::rename(&tmp_file, self.path())?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl StorageBackend for FsBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.load()?;
        let others: usize = map
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(key, others, value.len(), self.ceiling)?;

        map.insert(key.to_string(), value.to_string());
        self.persist(&map)?;
        debug!(backend = "file", key, bytes = value.len(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn ceiling(&self) -> Option<usize> {
        self.ceiling
    }
}

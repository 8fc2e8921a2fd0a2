//! # Configuration
//!
//! Configuration is managed by [`confique`], which handles layered loading
//! from environment variables, a TOML file and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `MEMORA_DATA_DIR`, `MEMORA_BACKEND`, ...
//! 2. **Config file**: `memora.toml` in the OS config directory (via the
//!    `directories` crate), or an explicit path.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_dir` | OS data dir | Where the stores live |
//! | `backend` | `blob` | Primary backend: `blob` (one file per key) or `file` (single JSON map) |
//! | `quota_bytes` | backend default | Override the primary backend ceiling |
//! | `migrate_legacy` | `true` | With `blob`, copy keys forward from the `file` store on first read |
//! | `cleanup_legacy` | `false` | Delete the `file` copy once migrated |
//! | `keys.*` | `memoralink_*` | Persisted key names |
//!
//! Key names must stay stable across releases: restore and reads match them
//! exactly.

use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{MemoraError, Result};
use crate::model::CollectionKind;

pub const CONFIG_FILE_NAME: &str = "memora.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Single JSON map file, small ceiling.
    File,
    /// One file per key, large ceiling.
    Blob,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => f.write_str("file"),
            BackendKind::Blob => f.write_str("blob"),
        }
    }
}

/// Persisted key names, one per collection plus the session entries.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    #[config(default = "memoralink_vocab")]
    pub vocabulary: String,

    #[config(default = "memoralink_writing_logs")]
    pub writing_logs: String,

    #[config(default = "memoralink_classical_logs")]
    pub classical_logs: String,

    #[config(default = "memoralink_gen_mode")]
    pub session_mode: String,

    #[config(default = "memoralink_draft_cards")]
    pub session_drafts: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            vocabulary: "memoralink_vocab".to_string(),
            writing_logs: "memoralink_writing_logs".to_string(),
            classical_logs: "memoralink_classical_logs".to_string(),
            session_mode: "memoralink_gen_mode".to_string(),
            session_drafts: "memoralink_draft_cards".to_string(),
        }
    }
}

impl StorageKeys {
    pub fn collection(&self, kind: CollectionKind) -> &str {
        match kind {
            CollectionKind::Vocabulary => &self.vocabulary,
            CollectionKind::Writing => &self.writing_logs,
            CollectionKind::Classical => &self.classical_logs,
        }
    }
}

/// Configuration for memora, stored in `memora.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemoraConfig {
    /// Directory holding the stores. Defaults to the OS data directory.
    #[config(env = "MEMORA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Primary backend.
    #[config(env = "MEMORA_BACKEND", default = "blob")]
    pub backend: BackendKind,

    /// Ceiling of the primary backend in bytes.
    #[config(env = "MEMORA_QUOTA_BYTES")]
    pub quota_bytes: Option<usize>,

    #[config(env = "MEMORA_MIGRATE_LEGACY", default = true)]
    pub migrate_legacy: bool,

    #[config(env = "MEMORA_CLEANUP_LEGACY", default = false)]
    pub cleanup_legacy: bool,

    #[config(nested)]
    pub keys: StorageKeys,
}

impl Default for MemoraConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            backend: BackendKind::Blob,
            quota_bytes: None,
            migrate_legacy: true,
            cleanup_legacy: false,
            keys: StorageKeys::default(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "memoralink", "memora")
}

impl MemoraConfig {
    /// Load from the environment and a config file.
    ///
    /// With no explicit path, the OS config directory's `memora.toml` is used
    /// when it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = MemoraConfig::builder().env();
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| project_dirs().map(|d| d.config_dir().join(CONFIG_FILE_NAME)));
        if let Some(file) = file {
            if path.is_some() && !file.exists() {
                return Err(MemoraError::Config(format!(
                    "config file not found: {}",
                    file.display()
                )));
            }
            builder = builder.file(file);
        }
        builder
            .load()
            .map_err(|e| MemoraError::Config(e.to_string()))
    }

    /// Resolved data directory.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .ok_or_else(|| {
                MemoraError::Config("no home directory; set MEMORA_DATA_DIR".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MemoraConfig::default();
        assert_eq!(config.backend, BackendKind::Blob);
        assert!(config.migrate_legacy);
        assert!(!config.cleanup_legacy);
        assert_eq!(config.keys.vocabulary, "memoralink_vocab");
    }

    #[test]
    fn test_collection_keys() {
        let keys = StorageKeys::default();
        assert_eq!(
            keys.collection(CollectionKind::Writing),
            "memoralink_writing_logs"
        );
        assert_eq!(
            keys.collection(CollectionKind::Classical),
            "memoralink_classical_logs"
        );
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = MemoraConfig {
            data_dir: Some(PathBuf::from("/tmp/memora")),
            ..Default::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/memora"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut doc = toml::Table::new();
        doc.insert("backend".into(), toml::Value::String("file".into()));
        doc.insert("quota_bytes".into(), toml::Value::Integer(1024));
        let mut keys = toml::Table::new();
        keys.insert("vocabulary".into(), toml::Value::String("my_vocab".into()));
        doc.insert("keys".into(), toml::Value::Table(keys));
        std::fs::write(&path, toml::to_string(&doc).unwrap()).unwrap();

        let config = MemoraConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backend, BackendKind::File);
        assert_eq!(config.quota_bytes, Some(1024));
        assert_eq!(config.keys.vocabulary, "my_vocab");
        // Unset keys keep their defaults
        assert_eq!(config.keys.writing_logs, "memoralink_writing_logs");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemoraConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, MemoraError::Config(_)));
    }
}

//! Ephemeral session cache.
//!
//! Holds in-progress generation state (the last selected mode and the draft
//! cards not yet saved). It owns a private [`MemBackend`], so nothing here
//! outlives the process and nothing is ever written to disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::StorageKeys;
use crate::error::{MemoraError, Result};
use crate::model::VocabularyDraft;
use crate::store::mem_backend::MemBackend;
use crate::store::KvStore;

/// How new vocabulary cards are generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    #[default]
    Topic,
    Passage,
    WordList,
}

impl GenerationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationMode::Topic => "topic",
            GenerationMode::Passage => "passage",
            GenerationMode::WordList => "word-list",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = MemoraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "topic" => Ok(GenerationMode::Topic),
            "passage" => Ok(GenerationMode::Passage),
            "word-list" => Ok(GenerationMode::WordList),
            other => Err(MemoraError::InvalidRecord(format!(
                "unknown generation mode '{}'",
                other
            ))),
        }
    }
}

pub struct SessionCache {
    store: KvStore,
    mode_key: String,
    drafts_key: String,
}

impl SessionCache {
    pub fn new(keys: &StorageKeys) -> Self {
        Self {
            store: KvStore::new(MemBackend::new()),
            mode_key: keys.session_mode.clone(),
            drafts_key: keys.session_drafts.clone(),
        }
    }

    pub async fn mode(&self) -> GenerationMode {
        self.read_or_default(&self.mode_key).await
    }

    pub async fn set_mode(&self, mode: GenerationMode) -> Result<()> {
        self.store.set_json(&self.mode_key, &mode).await
    }

    /// Draft cards from the last generation run, not yet saved.
    pub async fn draft_cards(&self) -> Vec<VocabularyDraft> {
        self.read_or_default(&self.drafts_key).await
    }

    pub async fn set_draft_cards(&self, drafts: &[VocabularyDraft]) -> Result<()> {
        self.store.set_json(&self.drafts_key, drafts).await
    }

    pub async fn clear_draft_cards(&self) -> Result<()> {
        self.store.remove(&self.drafts_key).await
    }

    async fn read_or_default<T>(&self, key: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        match self.store.get_json::<T>(key).await {
            Ok(Some(value)) => value,
            Ok(None) => T::default(),
            Err(e) => {
                debug!(key, error = %e, "unreadable session value, using default");
                T::default()
            }
        }
    }
}

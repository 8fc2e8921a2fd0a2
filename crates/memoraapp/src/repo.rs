//! # Record Repositories
//!
//! A [`Repository`] owns one collection stored as a single JSON array under one
//! key. All writes are whole-collection: read the array, change it in memory,
//! write it back in one `set`. There is no row-level update.
//!
//! ## Ordering
//!
//! Collections are stored most-recent first. `add` prepends; restore appends
//! merged-in records after the existing ones.
//!
//! ## Uniqueness
//!
//! - Vocabulary cards are unique by `word`. Adding an existing word returns
//!   `false` and writes nothing.
//! - Log entries are keyed by a generated id and `add` always succeeds.
//!
//! ## Errors
//!
//! A quota rejection from the store comes back as
//! [`crate::error::MemoraError::CollectionQuotaExceeded`] naming the collection. A missing
//! key lists as empty; an unreadable stored value is an error and is never
//! silently reset.
//!
//! Two processes writing the same collection race: the last write wins.

use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;

use crate::config::StorageKeys;
use crate::error::Result;
use crate::model::{ClassicalTextLogEntry, CollectionKind, Record, VocabularyCard, WritingLogEntry};
use crate::store::KvStore;

pub type VocabularyRepo = Repository<VocabularyCard>;
pub type WritingRepo = Repository<WritingLogEntry>;
pub type ClassicalRepo = Repository<ClassicalTextLogEntry>;

/// The three repositories, sharing one store.
pub struct Library {
    pub vocabulary: VocabularyRepo,
    pub writing: WritingRepo,
    pub classical: ClassicalRepo,
}

impl Library {
    pub fn new(store: Rc<KvStore>, keys: &StorageKeys) -> Self {
        Self {
            vocabulary: Repository::new(store.clone(), keys.vocabulary.as_str()),
            writing: Repository::new(store.clone(), keys.writing_logs.as_str()),
            classical: Repository::new(store, keys.classical_logs.as_str()),
        }
    }

    /// Stored record count of one collection.
    pub async fn count(&self, kind: CollectionKind) -> Result<usize> {
        match kind {
            CollectionKind::Vocabulary => self.vocabulary.len().await,
            CollectionKind::Writing => self.writing.len().await,
            CollectionKind::Classical => self.classical.len().await,
        }
    }
}

pub struct Repository<R: Record> {
    store: Rc<KvStore>,
    key: String,
    _record: PhantomData<R>,
}

impl<R: Record> Repository<R> {
    pub fn new(store: Rc<KvStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            _record: PhantomData,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        R::KIND
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// All records, most recently added first.
    pub async fn list(&self) -> Result<Vec<R>> {
        Ok(self
            .store
            .get_json::<Vec<R>>(&self.key)
            .await?
            .unwrap_or_default())
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.list().await?.is_empty())
    }

    pub async fn get(&self, key: &str) -> Result<Option<R>> {
        Ok(self.list().await?.into_iter().find(|r| r.key() == key))
    }

    /// Prepend `record` and persist.
    ///
    /// Returns `false` without writing when the collection rejects duplicates
    /// and the key is already present.
    pub async fn add(&self, record: R) -> Result<bool> {
        let mut records = self.list().await?;
        if R::UNIQUE_ON_ADD && records.iter().any(|r| r.key() == record.key()) {
            debug!(collection = R::KIND.as_str(), key = record.key(), "duplicate rejected");
            return Ok(false);
        }
        records.insert(0, record);
        self.save(&records).await?;
        Ok(true)
    }

    /// Replace the stored record with the same key, keeping its position.
    /// Returns `false` when no record has that key.
    pub async fn update(&self, record: R) -> Result<bool> {
        let mut records = self.list().await?;
        let Some(slot) = records.iter_mut().find(|r| r.key() == record.key()) else {
            return Ok(false);
        };
        *slot = record;
        self.save(&records).await?;
        Ok(true)
    }

    /// Remove the record with `key`. A missing key is a no-op returning
    /// `false`; nothing is written in that case.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let mut records = self.list().await?;
        let Some(pos) = records.iter().position(|r| r.key() == key) else {
            return Ok(false);
        };
        records.remove(pos);
        self.save(&records).await?;
        Ok(true)
    }

    /// Replace the whole collection.
    pub async fn save(&self, records: &[R]) -> Result<()> {
        self.store
            .set_json(&self.key, records)
            .await
            .map_err(|e| e.in_collection(R::KIND))?;
        debug!(collection = R::KIND.as_str(), count = records.len(), "saved collection");
        Ok(())
    }
}

impl VocabularyRepo {
    /// Apply `edit` to the card for `word` and persist it.
    /// Returns the edited card, or `None` when the word is not stored.
    pub async fn edit<F>(&self, word: &str, edit: F) -> Result<Option<VocabularyCard>>
    where
        F: FnOnce(&mut VocabularyCard),
    {
        let mut records = self.list().await?;
        let Some(card) = records.iter_mut().find(|c| c.word() == word) else {
            return Ok(None);
        };
        edit(card);
        let edited = card.clone();
        self.save(&records).await?;
        Ok(Some(edited))
    }
}

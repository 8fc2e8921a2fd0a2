//! # API Facade
//!
//! [`MemoraApi`] is the single entry point for clients. It owns one
//! [`KvStore`] shared by the three repositories, plus the session cache, and
//! dispatches to the command and backup modules.
//!
//! The facade does no business logic and no I/O of its own: it converts
//! drafts into records, forwards to `commands/*` or `backup/*`, and returns
//! structured results. Rendering and exit codes belong to the client.
//!
//! ## Construction
//!
//! - [`MemoraApi::open`]: stores from a [`MemoraConfig`]. With the default
//!   `blob` backend the stores live under `<data_dir>/blobs/`, and keys
//!   missing there are copied forward from the older single-file store at
//!   `<data_dir>/store.json`.
//! - [`MemoraApi::in_memory`]: a throwaway store for tests.
//! - [`MemoraApi::with_store`]: any pre-built store.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::backup::{self, BackupSnapshot, RestoreReport};
use crate::commands::{self, CmdResult};
use crate::config::{BackendKind, MemoraConfig, StorageKeys};
use crate::error::Result;
use crate::model::{
    ClassicalDraft, ClassicalTextLogEntry, VocabularyCard, VocabularyDraft, WritingDraft,
    WritingLogEntry,
};
use crate::repo::{ClassicalRepo, Library, VocabularyRepo, WritingRepo};
use crate::session::SessionCache;
use crate::store::blob_backend::{BlobBackend, DEFAULT_BLOB_CEILING};
use crate::store::fs_backend::{FsBackend, DEFAULT_FS_CEILING};
use crate::store::mem_backend::MemBackend;
use crate::store::KvStore;

const BLOB_DIR: &str = "blobs";

pub struct MemoraApi {
    store: Rc<KvStore>,
    library: Library,
    session: SessionCache,
    keys: StorageKeys,
}

impl MemoraApi {
    pub fn with_store(store: KvStore, keys: StorageKeys) -> Self {
        let store = Rc::new(store);
        Self {
            library: Library::new(store.clone(), &keys),
            session: SessionCache::new(&keys),
            store,
            keys,
        }
    }

    pub fn open(config: &MemoraConfig) -> Result<Self> {
        let data_dir = config.data_dir()?;
        let store = match config.backend {
            BackendKind::Blob => {
                let primary = BlobBackend::new(data_dir.join(BLOB_DIR))
                    .with_ceiling(Some(config.quota_bytes.unwrap_or(DEFAULT_BLOB_CEILING)));
                let store = KvStore::new(primary);
                if config.migrate_legacy {
                    store.with_legacy(FsBackend::new(&data_dir), config.cleanup_legacy)
                } else {
                    store
                }
            }
            BackendKind::File => KvStore::new(
                FsBackend::new(&data_dir)
                    .with_ceiling(Some(config.quota_bytes.unwrap_or(DEFAULT_FS_CEILING))),
            ),
        };
        debug!(
            backend = store.backend_name(),
            data_dir = %data_dir.display(),
            "opened store"
        );
        Ok(Self::with_store(store, config.keys.clone()))
    }

    pub fn in_memory() -> Self {
        Self::with_store(KvStore::new(MemBackend::new()), StorageKeys::default())
    }

    pub fn vocabulary(&self) -> &VocabularyRepo {
        &self.library.vocabulary
    }

    pub fn writing(&self) -> &WritingRepo {
        &self.library.writing
    }

    pub fn classical(&self) -> &ClassicalRepo {
        &self.library.classical
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub fn ceiling(&self) -> Option<usize> {
        self.store.ceiling()
    }

    pub async fn add_card(&self, draft: VocabularyDraft) -> Result<CmdResult<VocabularyCard>> {
        let card = VocabularyCard::new(draft)?;
        commands::vocab::add(&self.library.vocabulary, card).await
    }

    pub async fn remove_card<I: AsRef<str>>(
        &self,
        words: &[I],
    ) -> Result<CmdResult<VocabularyCard>> {
        commands::vocab::remove(&self.library.vocabulary, words).await
    }

    pub async fn tag_card<S: AsRef<str>>(
        &self,
        word: &str,
        add: &[S],
        remove: &[S],
    ) -> Result<CmdResult<VocabularyCard>> {
        commands::vocab::tag(&self.library.vocabulary, word, add, remove).await
    }

    pub async fn attach_image(
        &self,
        word: &str,
        image: Option<(&str, &[u8])>,
    ) -> Result<CmdResult<VocabularyCard>> {
        commands::vocab::attach_image(&self.library.vocabulary, word, image).await
    }

    pub async fn add_writing_log(&self, draft: WritingDraft) -> Result<CmdResult<WritingLogEntry>> {
        let entry = WritingLogEntry::new(draft)?;
        commands::logs::add(&self.library.writing, entry).await
    }

    pub async fn remove_writing_log<I: AsRef<str>>(
        &self,
        ids: &[I],
    ) -> Result<CmdResult<WritingLogEntry>> {
        commands::logs::remove(&self.library.writing, ids).await
    }

    pub async fn add_classical_log(
        &self,
        draft: ClassicalDraft,
    ) -> Result<CmdResult<ClassicalTextLogEntry>> {
        let entry = ClassicalTextLogEntry::new(draft)?;
        commands::logs::add(&self.library.classical, entry).await
    }

    pub async fn remove_classical_log<I: AsRef<str>>(
        &self,
        ids: &[I],
    ) -> Result<CmdResult<ClassicalTextLogEntry>> {
        commands::logs::remove(&self.library.classical, ids).await
    }

    pub async fn export_snapshot(&self) -> Result<BackupSnapshot> {
        backup::export::snapshot(&self.library).await
    }

    pub async fn export_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        backup::export::to_dir(&self.library, dir).await
    }

    /// Merge a backup payload into the library. See [`crate::backup`] for
    /// the merge policy and [`backup::RESTORE_POLICY_NOTICE`] for the text to
    /// show first.
    pub async fn import_snapshot(&self, payload: &str) -> Result<RestoreReport> {
        backup::restore::run(&self.library, payload, self.store.ceiling()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::RestoreOutcome;
    use crate::error::MemoraError;
    use crate::model::CollectionKind;
    use crate::test_utils::TestEnv;

    fn draft(word: &str) -> VocabularyDraft {
        VocabularyDraft {
            word: word.to_string(),
            definition: "d".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_card_dispatches_and_validates() {
        let api = MemoraApi::in_memory();
        let result = api.add_card(draft("lucid")).await.unwrap();
        assert_eq!(result.affected[0].word(), "lucid");
        assert_eq!(api.vocabulary().len().await.unwrap(), 1);

        let err = api.add_card(draft("   ")).await.unwrap_err();
        assert!(matches!(err, MemoraError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_logs_dispatch_to_their_collections() {
        let api = MemoraApi::in_memory();
        api.add_writing_log(WritingDraft {
            original: "I has a pen".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
        api.add_classical_log(ClassicalDraft {
            original: "溫故而知新".to_string(),
            translation: "Review the old to learn the new".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(api.writing().len().await.unwrap(), 1);
        assert_eq!(api.classical().len().await.unwrap(), 1);
        assert!(api.vocabulary().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let source = MemoraApi::in_memory();
        source.add_card(draft("a")).await.unwrap();
        source.add_card(draft("b")).await.unwrap();
        let payload = source.export_snapshot().await.unwrap().to_json().unwrap();

        let target = MemoraApi::in_memory();
        let report = target.import_snapshot(&payload).await.unwrap();
        assert_eq!(report.outcome(), RestoreOutcome::Complete);
        assert_eq!(
            report.get(CollectionKind::Vocabulary).unwrap().stored,
            Some(2)
        );
        assert_eq!(
            target.vocabulary().list().await.unwrap(),
            source.vocabulary().list().await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_open_uses_configured_data_dir() {
        let mut env = TestEnv::new();
        env.config.quota_bytes = Some(4096);
        let api = env.api();
        assert_eq!(api.backend_name(), "blob");
        assert_eq!(api.ceiling(), Some(4096));

        api.add_card(draft("lucid")).await.unwrap();
        assert!(env.root.join("blobs").join("memoralink_vocab.json").exists());
    }

    #[tokio::test]
    async fn test_open_migrates_from_file_store() {
        let mut env = TestEnv::new();
        env.config.backend = BackendKind::File;
        env.api().add_card(draft("legacy")).await.unwrap();
        assert!(env.root.join("store.json").exists());

        env.config.backend = BackendKind::Blob;
        let api = env.api();
        let cards = api.vocabulary().list().await.unwrap();
        assert_eq!(cards[0].word(), "legacy");
        assert!(env.root.join("blobs").join("memoralink_vocab.json").exists());
    }
}

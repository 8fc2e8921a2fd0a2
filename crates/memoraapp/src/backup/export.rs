use chrono::{SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use uuid::Uuid;

use super::{BackupSnapshot, SNAPSHOT_VERSION};
use crate::error::Result;
use crate::repo::Library;

/// Read every collection into a snapshot. Never writes to the store.
pub async fn snapshot(library: &Library) -> Result<BackupSnapshot> {
    let vocabulary = library.vocabulary.list().await?;
    let writing_logs = library.writing.list().await?;
    let classical_logs = library.classical.list().await?;

    Ok(BackupSnapshot {
        version: SNAPSHOT_VERSION,
        date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        vocabulary: Some(vocabulary),
        writing_logs: Some(writing_logs),
        classical_logs: Some(classical_logs),
    })
}

/// Write a snapshot into `dir` under its dated file name and return the path.
///
/// The file is written to a temporary name first and renamed into place, so
/// an interrupted export never leaves a truncated backup behind.
pub async fn to_dir(library: &Library, dir: &Path) -> Result<PathBuf> {
    let snap = snapshot(library).await?;
    let payload = snap.to_json()?;

    fs::create_dir_all(dir).await?;
    let target = dir.join(snap.file_name());
    let tmp = dir.join(format!(".backup-{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, &payload).await?;
    fs::rename(&tmp, &target).await?;

    info!(
        path = %target.display(),
        bytes = payload.len(),
        vocabulary = snap.vocabulary.as_ref().map_or(0, Vec::len),
        writing = snap.writing_logs.as_ref().map_or(0, Vec::len),
        classical = snap.classical_logs.as_ref().map_or(0, Vec::len),
        "exported backup"
    );
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageKeys;
    use crate::model::{VocabularyCard, VocabularyDraft};
    use crate::store::mem_backend::MemBackend;
    use crate::store::KvStore;
    use std::rc::Rc;

    fn library() -> Library {
        Library::new(
            Rc::new(KvStore::new(MemBackend::new())),
            &StorageKeys::default(),
        )
    }

    #[tokio::test]
    async fn test_snapshot_of_empty_library_has_all_collections() {
        let snap = snapshot(&library()).await.unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.vocabulary, Some(vec![]));
        assert_eq!(snap.writing_logs, Some(vec![]));
        assert_eq!(snap.classical_logs, Some(vec![]));

        let json: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert!(json["writingLogs"].is_array());
        assert!(json["classicalLogs"].is_array());
        assert!(json["date"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_to_dir_writes_dated_file() {
        let lib = library();
        lib.vocabulary
            .add(
                VocabularyCard::new(VocabularyDraft {
                    word: "lucid".to_string(),
                    definition: "clear".to_string(),
                    ..Default::default()
                })
                .unwrap(),
            )
            .await
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = to_dir(&lib, dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("memoralink-backup-"));
        assert!(name.ends_with(".json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let back = BackupSnapshot::parse(&written).unwrap();
        assert_eq!(back.vocabulary.unwrap()[0].word(), "lucid");

        // No temp files left behind
        for entry in std::fs::read_dir(dir.path()).unwrap() {
            let entry_name = entry.unwrap().file_name();
            assert!(!entry_name.to_str().unwrap().ends_with(".tmp"));
        }
    }
}

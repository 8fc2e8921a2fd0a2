use std::collections::HashSet;

use tracing::{info, warn};

use super::{BackupSnapshot, CollectionOutcome, RestoreReport};
use crate::error::{MemoraError, Result};
use crate::model::{CollectionKind, Record};
use crate::repo::{Library, Repository};

/// Merge a backup payload into the library.
///
/// Returns `Err` only for problems found before anything is written
/// (malformed payload, collections too large for `ceiling`). Once merging
/// starts, each collection succeeds or fails on its own and the report says
/// which.
pub async fn run(library: &Library, payload: &str, ceiling: Option<usize>) -> Result<RestoreReport> {
    let snapshot = BackupSnapshot::parse(payload)?;
    if let Some(ceiling) = ceiling {
        // Measured as stored, not as the pretty-printed file.
        let size = snapshot.stored_size()?;
        if size > ceiling {
            return Err(MemoraError::PayloadTooLarge { size, ceiling });
        }
    }

    let mut report = RestoreReport::default();
    if let Some(cards) = snapshot.vocabulary {
        report
            .collections
            .push(merge_into(&library.vocabulary, cards).await);
    }
    if let Some(entries) = snapshot.writing_logs {
        report
            .collections
            .push(merge_into(&library.writing, entries).await);
    }
    if let Some(entries) = snapshot.classical_logs {
        report
            .collections
            .push(merge_into(&library.classical, entries).await);
    }

    // Report what storage actually holds, not what we meant to write.
    for outcome in &mut report.collections {
        outcome.stored = match library.count(outcome.kind).await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(collection = outcome.kind.as_str(), error = %e, "could not re-read collection");
                None
            }
        };
    }

    info!(
        added = report.total_added(),
        outcome = ?report.outcome(),
        "restore finished"
    );
    Ok(report)
}

async fn merge_into<R: Record>(repo: &Repository<R>, incoming: Vec<R>) -> CollectionOutcome {
    let kind = R::KIND;
    let mut outcome = CollectionOutcome {
        kind,
        added: 0,
        skipped: 0,
        stored: None,
        error: None,
    };

    let mut records = match repo.list().await {
        Ok(records) => records,
        Err(e) => {
            fail(&mut outcome, kind, e);
            return outcome;
        }
    };

    let (added, skipped) = merge_by_key(&mut records, incoming);
    outcome.added = added;
    outcome.skipped = skipped;

    if added > 0 {
        if let Err(e) = repo.save(&records).await {
            outcome.added = 0;
            fail(&mut outcome, kind, e);
        }
    }
    outcome
}

fn fail(outcome: &mut CollectionOutcome, kind: CollectionKind, error: MemoraError) {
    warn!(collection = kind.as_str(), error = %error, "restore of collection failed");
    outcome.error = Some(error);
}

/// Append incoming records whose key is not yet present, in incoming order.
/// Returns (added, skipped).
fn merge_by_key<R: Record>(existing: &mut Vec<R>, incoming: Vec<R>) -> (usize, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.key().to_string()).collect();
    let mut added = 0;
    let mut skipped = 0;
    for record in incoming {
        if seen.insert(record.key().to_string()) {
            existing.push(record);
            added += 1;
        } else {
            skipped += 1;
        }
    }
    (added, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::RestoreOutcome;
    use crate::config::StorageKeys;
    use crate::model::{VocabularyCard, VocabularyDraft};
    use crate::store::mem_backend::MemBackend;
    use crate::store::KvStore;
    use std::rc::Rc;

    fn card(word: &str, definition: &str) -> VocabularyCard {
        VocabularyCard::new(VocabularyDraft {
            word: word.to_string(),
            definition: definition.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn words(cards: &[VocabularyCard]) -> Vec<&str> {
        cards.iter().map(|c| c.word()).collect()
    }

    #[test]
    fn test_merge_by_key_appends_new_and_drops_duplicates() {
        let mut existing = vec![card("b", "live"), card("a", "live")];
        let incoming = vec![card("a", "incoming"), card("c", "x"), card("c", "y"), card("d", "z")];

        let (added, skipped) = merge_by_key(&mut existing, incoming);
        assert_eq!((added, skipped), (2, 2));
        assert_eq!(words(&existing), vec!["b", "a", "c", "d"]);
        assert_eq!(existing[1].definition(), "live");
        assert_eq!(existing[2].definition(), "x");
    }

    #[tokio::test]
    async fn test_nothing_new_means_no_write() {
        let backend = Rc::new(MemBackend::new());
        let library = Library::new(
            Rc::new(KvStore::new(backend.clone())),
            &StorageKeys::default(),
        );
        library.vocabulary.add(card("a", "d")).await.unwrap();

        // A write now would fail, so a clean outcome proves none was attempted
        backend.set_simulate_write_error(true);
        let payload = serde_json::json!({ "vocabulary": [{"word": "a", "definition": "d"}] });
        let report = run(&library, &payload.to_string(), None).await.unwrap();

        assert_eq!(report.outcome(), RestoreOutcome::Complete);
        let vocab = report.get(CollectionKind::Vocabulary).unwrap();
        assert_eq!((vocab.added, vocab.skipped, vocab.stored), (0, 1, Some(1)));
    }

    #[tokio::test]
    async fn test_malformed_payload_wins_over_size() {
        let library = Library::new(
            Rc::new(KvStore::new(MemBackend::new())),
            &StorageKeys::default(),
        );
        let err = run(&library, "garbage that is long", Some(4))
            .await
            .unwrap_err();
        assert!(matches!(err, MemoraError::InvalidFormat(_)));

        let payload = r#"{"vocabulary": [{"word": "a", "definition": "d"}]}"#;
        let err = run(&library, payload, Some(4)).await.unwrap_err();
        assert!(matches!(
            err,
            MemoraError::PayloadTooLarge { size, ceiling: 4 } if size > 4
        ));
    }

    #[tokio::test]
    async fn test_size_check_ignores_pretty_printing() {
        let library = Library::new(
            Rc::new(KvStore::new(MemBackend::new())),
            &StorageKeys::default(),
        );
        let snapshot = BackupSnapshot {
            version: 1,
            date: String::new(),
            vocabulary: Some(vec![card("lucid", "clear")]),
            writing_logs: Some(vec![]),
            classical_logs: None,
        };
        let pretty = snapshot.to_json().unwrap();
        let stored = snapshot.stored_size().unwrap();
        assert!(pretty.len() > stored);

        let report = run(&library, &pretty, Some(stored)).await.unwrap();
        assert_eq!(report.outcome(), RestoreOutcome::Complete);
        assert_eq!(library.vocabulary.len().await.unwrap(), 1);
    }
}

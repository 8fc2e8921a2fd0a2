//! # Backup and Restore
//!
//! A backup is one JSON document holding every collection:
//!
//! ```json
//! {
//!   "version": 1,
//!   "date": "2026-10-16T09:30:00.000Z",
//!   "vocabulary": [ ... ],
//!   "writingLogs": [ ... ],
//!   "classicalLogs": [ ... ]
//! }
//! ```
//!
//! The snapshot is built on demand ([`export`]) and never stored in the key
//! value store itself. On restore ([`restore`]) it is parsed, size checked,
//! and merged into the live collections.
//!
//! ## Restore Policy: Merge by Key
//!
//! Restore never replaces a collection. Incoming cards whose `word` is new and
//! log entries whose `id` is new are appended; anything already present is
//! kept as it is and the incoming copy dropped. Importing the same backup
//! twice therefore changes nothing the second time. Clients must show
//! [`RESTORE_POLICY_NOTICE`] before restoring.
//!
//! ## Failure Handling
//!
//! - Malformed payloads fail with [`MemoraError::InvalidFormat`] and backups
//!   whose collections, stored as compact JSON, exceed the store ceiling
//!   with [`MemoraError::PayloadTooLarge`]. Both happen before any write.
//! - Each collection is then persisted on its own. A failure on one does not
//!   stop the others; the [`RestoreReport`] records which failed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MemoraError, Result};
use crate::model::{ClassicalTextLogEntry, CollectionKind, Record, VocabularyCard, WritingLogEntry};

pub mod export;
pub mod restore;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

pub const RESTORE_POLICY_NOTICE: &str = "Restoring merges the backup into your current library: \
     new words and log entries are added, entries you already have are kept unchanged.";

const VOCABULARY_FIELDS: &[&str] = &["vocabulary", "vocab"];
const WRITING_FIELDS: &[&str] = &["writingLogs", "writing"];
const CLASSICAL_FIELDS: &[&str] = &["classicalLogs", "classical"];

/// A versioned bundle of all collections.
///
/// A collection that is `None` was absent from an imported file and is left
/// untouched by restore. Exported snapshots always carry all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSnapshot {
    pub version: u32,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocabulary: Option<Vec<VocabularyCard>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writing_logs: Option<Vec<WritingLogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classical_logs: Option<Vec<ClassicalTextLogEntry>>,
}

impl BackupSnapshot {
    /// Parse and structurally validate a backup payload.
    ///
    /// Accepts files without a `version` (treated as version 1) and the short
    /// collection names `vocab`, `writing` and `classical`. Fails with
    /// [`MemoraError::InvalidFormat`] when the payload is not a JSON object,
    /// has a newer version, has none of the collections, or holds a record
    /// that does not validate.
    pub fn parse(payload: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| MemoraError::InvalidFormat(format!("not valid JSON ({})", e)))?;
        let Value::Object(mut obj) = value else {
            return Err(MemoraError::InvalidFormat(
                "expected a JSON object at the top level".to_string(),
            ));
        };

        let version = match obj.get("version") {
            None | Some(Value::Null) => SNAPSHOT_VERSION,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| {
                    MemoraError::InvalidFormat("'version' must be a positive integer".to_string())
                })?,
        };
        if version == 0 || version > SNAPSHOT_VERSION {
            return Err(MemoraError::InvalidFormat(format!(
                "unsupported backup version {} (this build reads up to {})",
                version, SNAPSHOT_VERSION
            )));
        }

        let date = obj
            .get("date")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let vocabulary = take_collection::<VocabularyCard>(&mut obj, VOCABULARY_FIELDS)?;
        let writing_logs = take_collection::<WritingLogEntry>(&mut obj, WRITING_FIELDS)?;
        let classical_logs = take_collection::<ClassicalTextLogEntry>(&mut obj, CLASSICAL_FIELDS)?;

        if vocabulary.is_none() && writing_logs.is_none() && classical_logs.is_none() {
            return Err(MemoraError::InvalidFormat(
                "no vocabulary, writingLogs or classicalLogs array found".to_string(),
            ));
        }

        Ok(Self {
            version,
            date,
            vocabulary,
            writing_logs,
            classical_logs,
        })
    }

    /// Pretty-printed JSON payload.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Bytes the non-empty collections take once stored, i.e. as compact
    /// JSON. The backup file itself is pretty-printed and larger.
    pub fn stored_size(&self) -> Result<usize> {
        fn compact<R: Serialize>(records: &Option<Vec<R>>) -> Result<usize> {
            match records {
                Some(records) if !records.is_empty() => Ok(serde_json::to_string(records)?.len()),
                _ => Ok(0),
            }
        }
        Ok(compact(&self.vocabulary)? + compact(&self.writing_logs)? + compact(&self.classical_logs)?)
    }

    /// Download file name, embedding the export date.
    pub fn file_name(&self) -> String {
        let day = self
            .date
            .get(..10)
            .filter(|d| d.chars().all(|c| c.is_ascii_digit() || c == '-'))
            .unwrap_or("undated");
        format!("memoralink-backup-{}.json", day)
    }

    /// Collections present in this snapshot.
    pub fn collections(&self) -> Vec<CollectionKind> {
        let mut kinds = Vec::new();
        if self.vocabulary.is_some() {
            kinds.push(CollectionKind::Vocabulary);
        }
        if self.writing_logs.is_some() {
            kinds.push(CollectionKind::Writing);
        }
        if self.classical_logs.is_some() {
            kinds.push(CollectionKind::Classical);
        }
        kinds
    }
}

fn take_collection<R: Record>(
    obj: &mut Map<String, Value>,
    names: &[&str],
) -> Result<Option<Vec<R>>> {
    let Some((name, value)) = names
        .iter()
        .find_map(|name| obj.remove(*name).map(|v| (*name, v)))
    else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Array(_) => serde_json::from_value(value).map(Some).map_err(|e| {
            MemoraError::InvalidFormat(format!(
                "'{}' holds an invalid {} record: {}",
                name,
                R::KIND,
                e
            ))
        }),
        _ => Err(MemoraError::InvalidFormat(format!(
            "'{}' must be an array",
            name
        ))),
    }
}

/// What happened to one collection during a restore.
#[derive(Debug)]
pub struct CollectionOutcome {
    pub kind: CollectionKind,
    /// Incoming records appended.
    pub added: usize,
    /// Incoming records dropped as duplicates.
    pub skipped: usize,
    /// Record count read back from storage after the restore, when readable.
    pub stored: Option<usize>,
    /// Why persisting this collection failed.
    pub error: Option<MemoraError>,
}

impl CollectionOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Every collection in the backup was merged.
    Complete,
    /// Some collections were merged, the listed ones failed.
    Partial { failed: Vec<CollectionKind> },
    /// No collection could be merged.
    Failed,
}

/// Result of a restore, one entry per collection present in the backup.
#[derive(Debug, Default)]
pub struct RestoreReport {
    pub collections: Vec<CollectionOutcome>,
}

impl RestoreReport {
    pub fn outcome(&self) -> RestoreOutcome {
        let failed: Vec<CollectionKind> = self
            .collections
            .iter()
            .filter(|c| !c.succeeded())
            .map(|c| c.kind)
            .collect();
        if failed.is_empty() {
            RestoreOutcome::Complete
        } else if failed.len() == self.collections.len() {
            RestoreOutcome::Failed
        } else {
            RestoreOutcome::Partial { failed }
        }
    }

    pub fn get(&self, kind: CollectionKind) -> Option<&CollectionOutcome> {
        self.collections.iter().find(|c| c.kind == kind)
    }

    pub fn total_added(&self) -> usize {
        self.collections.iter().map(|c| c.added).sum()
    }

    /// Turn anything short of a complete restore into an error.
    ///
    /// A partial restore becomes [`MemoraError::PartialRestore`]. A failed one
    /// becomes the underlying error when a single collection was involved,
    /// and [`MemoraError::RestoreFailed`] otherwise.
    pub fn into_result(self) -> Result<RestoreReport> {
        match self.outcome() {
            RestoreOutcome::Complete => Ok(self),
            RestoreOutcome::Failed if self.collections.len() == 1 => {
                let mut collections = self.collections;
                let outcome = collections.remove(0);
                Err(outcome.error.unwrap_or_else(|| {
                    MemoraError::Store(format!("restoring {} failed", outcome.kind))
                }))
            }
            RestoreOutcome::Failed => Err(MemoraError::RestoreFailed {
                failed: self.split().1,
            }),
            RestoreOutcome::Partial { .. } => {
                let (restored, failed) = self.split();
                Err(MemoraError::PartialRestore { restored, failed })
            }
        }
    }

    fn split(self) -> (Vec<CollectionKind>, Vec<(CollectionKind, String)>) {
        let mut restored = Vec::new();
        let mut failed = Vec::new();
        for outcome in self.collections {
            match outcome.error {
                None => restored.push(outcome.kind),
                Some(e) => failed.push((outcome.kind, e.to_string())),
            }
        }
        (restored, failed)
    }
}

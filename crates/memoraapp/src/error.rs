//! Error types for memoraapp.
//!
//! A read miss is never an error: adapters return `None` and repositories list
//! an empty collection. Everything else that can go wrong at the storage,
//! repository or restore boundary is a [`MemoraError`].

use crate::model::CollectionKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoraError>;

#[derive(Debug, Error)]
pub enum MemoraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored value under '{key}' is unreadable: {source}")]
    CorruptValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The backend refused a write because it would exceed its ceiling.
    #[error(
        "Storage quota exceeded writing '{key}' ({size} bytes, ceiling {ceiling} bytes); \
         delete old data or shrink images"
    )]
    QuotaExceeded {
        key: String,
        size: usize,
        ceiling: usize,
    },

    /// Same as [`MemoraError::QuotaExceeded`], re-raised with the owning collection.
    #[error(
        "Not enough storage to save {collection} ({size} bytes, ceiling {ceiling} bytes); \
         delete old entries or remove images and try again"
    )]
    CollectionQuotaExceeded {
        collection: CollectionKind,
        size: usize,
        ceiling: usize,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Invalid backup file: {0}")]
    InvalidFormat(String),

    #[error(
        "Backup is too large to restore ({size} bytes, storage ceiling {ceiling} bytes); \
         strip images from the backup and retry"
    )]
    PayloadTooLarge { size: usize, ceiling: usize },

    /// Some collections were restored, others failed to persist.
    #[error("Restore only partially applied: {}", describe_failures(.failed))]
    PartialRestore {
        restored: Vec<CollectionKind>,
        failed: Vec<(CollectionKind, String)>,
    },

    /// Every collection in the backup failed to persist.
    #[error("Restore failed, nothing was imported: {}", describe_failures(.failed))]
    RestoreFailed {
        failed: Vec<(CollectionKind, String)>,
    },
}

impl MemoraError {
    /// True for both the adapter-level and the collection-level quota error.
    pub fn is_quota(&self) -> bool {
        matches!(
            self,
            MemoraError::QuotaExceeded { .. } | MemoraError::CollectionQuotaExceeded { .. }
        )
    }

    /// Attach the owning collection to an adapter-level quota error.
    pub(crate) fn in_collection(self, collection: CollectionKind) -> Self {
        match self {
            MemoraError::QuotaExceeded { size, ceiling, .. } => {
                MemoraError::CollectionQuotaExceeded {
                    collection,
                    size,
                    ceiling,
                }
            }
            other => other,
        }
    }
}

fn describe_failures(failed: &[(CollectionKind, String)]) -> String {
    failed
        .iter()
        .map(|(kind, reason)| format!("{} failed ({})", kind, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

//! Document stores survey responses are written to.

mod jsonl;
mod memory;
mod pending;

pub(crate) use jsonl::JsonLinesStore;
pub(crate) use memory::MemoryStore;
pub(crate) use pending::{PendingSubmission, PollableState};

use crate::form::CollectedResponse;
use chrono::{SecondsFormat, Utc};
use std::fmt;

/// The maximum number of writes a single batch may contain.
pub(crate) const MAX_BATCH_WRITES: usize = 500;

/// The identifier a store assigns to a document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DocumentId(String);

impl DocumentId {
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A store of schema-less documents grouped in named collections.
pub(crate) trait DocumentStore: Send + Sync {
    /// Write all records atomically: either all of them are stored or none are.
    ///
    /// Server timestamp placeholders are replaced with the store's time.
    fn commit_batch(&self, collection: &str, records: Vec<CollectedResponse>) -> Result<Vec<DocumentId>, StoreError>;

    /// Write a single record.
    fn add_document(&self, collection: &str, record: CollectedResponse) -> Result<DocumentId, StoreError> {
        self.commit_batch(collection, vec![record])?.pop().ok_or(StoreError::EmptyCommit)
    }
}

/// The time used to resolve server timestamp placeholders.
pub(crate) fn server_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn validate_collection(collection: &str) -> Result<(), StoreError> {
    let valid = !collection.is_empty()
        && collection != "."
        && collection != ".."
        && !collection.contains(['/', '\\'])
        && !collection.chars().any(char::is_control);
    if valid { Ok(()) } else { Err(StoreError::InvalidCollection(collection.to_string())) }
}

fn check_batch_size(size: usize) -> Result<(), StoreError> {
    if size > MAX_BATCH_WRITES {
        return Err(StoreError::BatchTooLarge { size, limit: MAX_BATCH_WRITES });
    }
    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serializing document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("batch of {size} writes exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("store committed no documents")]
    EmptyCommit,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

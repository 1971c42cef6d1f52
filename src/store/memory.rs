use super::{DocumentId, DocumentStore, StoreError, check_batch_size, server_timestamp, validate_collection};
use crate::form::CollectedResponse;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, Vec<(DocumentId, CollectedResponse)>>,
    failure: Option<String>,
}

/// A store that keeps documents in memory and forgets them on exit.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Make every subsequent write fail with the given reason.
    #[cfg(test)]
    pub(crate) fn fail_with<S: Into<String>>(&self, reason: S) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).failure = Some(reason.into());
    }

    #[cfg(test)]
    pub(crate) fn recover(&self) {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).failure = None;
    }

    /// The documents stored in a collection, in insertion order.
    pub(crate) fn documents(&self, collection: &str) -> Vec<(DocumentId, CollectedResponse)> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.collections.get(collection).cloned().unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    fn commit_batch(
        &self,
        collection: &str,
        records: Vec<CollectedResponse>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        check_batch_size(records.len())?;
        validate_collection(collection)?;

        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(reason) = &inner.failure {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let now = server_timestamp();
        let documents = inner.collections.entry(collection.to_string()).or_default();
        let ids: Vec<_> = records
            .into_iter()
            .map(|mut record| {
                record.resolve_timestamps(&now);
                let id = DocumentId::generate();
                documents.push((id.clone(), record));
                id
            })
            .collect();
        Ok(ids)
    }
}

use super::{DocumentId, DocumentStore, StoreError, check_batch_size, server_timestamp, validate_collection};
use crate::form::CollectedResponse;
use serde::Serialize;
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

#[derive(Serialize)]
struct StoredDocument<'a> {
    id: &'a str,
    fields: &'a CollectedResponse,
}

/// A store that keeps every collection as a JSON lines file inside a directory.
///
/// Batches are committed by writing the whole collection to a temporary file and renaming it
/// over the existing file, so a failed commit never leaves partial documents behind. Commits
/// hold an exclusive lock on `<collection>.lock` so stores opened on the same directory, in this
/// process or another, never overwrite each other's batches.
#[derive(Debug)]
pub(crate) struct JsonLinesStore {
    root: PathBuf,
}

impl JsonLinesStore {
    /// Open a store rooted at the given directory, creating it if needed.
    pub(crate) fn open<P: Into<PathBuf>>(root: P) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, collection: &str) -> Result<PathBuf, StoreError> {
        validate_collection(collection)?;
        Ok(self.root.join(format!("{collection}.jsonl")))
    }

    /// Take the collection's lock. It is released when the returned file is dropped.
    fn lock_collection(&self, collection: &str) -> Result<File, StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.root.join(format!("{collection}.lock")))?;
        file.lock()?;
        Ok(file)
    }

    #[cfg(test)]
    pub(crate) fn read_documents(&self, collection: &str) -> Result<Vec<serde_json::Value>, StoreError> {
        let contents = match fs::read_to_string(self.collection_path(collection)?) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        contents.lines().map(|line| serde_json::from_str(line).map_err(StoreError::from)).collect()
    }
}

impl DocumentStore for JsonLinesStore {
    fn commit_batch(
        &self,
        collection: &str,
        mut records: Vec<CollectedResponse>,
    ) -> Result<Vec<DocumentId>, StoreError> {
        check_batch_size(records.len())?;
        let path = self.collection_path(collection)?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let now = server_timestamp();
        let mut lines = Vec::new();
        let mut ids = Vec::with_capacity(records.len());
        for record in &mut records {
            record.resolve_timestamps(&now);
            let id = DocumentId::generate();
            serde_json::to_writer(&mut lines, &StoredDocument { id: id.as_str(), fields: &*record })?;
            lines.push(b'\n');
            ids.push(id);
        }

        let _lock = self.lock_collection(collection)?;
        let existing = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        let mut file = NamedTempFile::new_in(&self.root)?;
        file.write_all(&existing)?;
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            file.write_all(b"\n")?;
        }
        file.write_all(&lines)?;
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;

        tracing::debug!(collection, count = ids.len(), path = %path.display(), "committed batch");
        Ok(ids)
    }
}

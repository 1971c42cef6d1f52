use super::{DocumentId, DocumentStore, StoreError};
use crate::form::CollectedResponse;
use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

/// The state of an in-flight operation.
#[derive(Debug)]
pub(crate) enum PollableState<T> {
    /// The operation hasn't finished yet.
    Pending,
    /// The operation finished. This is only reported once.
    Done(T),
}

type SubmissionResult = Result<DocumentId, StoreError>;

/// A document being written to a store on a worker thread.
#[derive(Debug)]
pub(crate) struct PendingSubmission {
    result: Arc<Mutex<Option<SubmissionResult>>>,
    handle: Option<JoinHandle<()>>,
}

impl PendingSubmission {
    /// Start writing `record` into `collection`.
    pub(crate) fn start(store: Arc<dyn DocumentStore>, collection: String, record: CollectedResponse) -> Self {
        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();
        let handle = thread::spawn(move || {
            let outcome = store.add_document(&collection, record);
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
        });
        Self { result, handle: Some(handle) }
    }

    pub(crate) fn poll(&mut self) -> PollableState<SubmissionResult> {
        // Checked before taking the result: a finished worker has always published by then.
        let finished = self.handle.as_ref().is_some_and(JoinHandle::is_finished);
        let outcome = self.result.lock().unwrap_or_else(PoisonError::into_inner).take();
        match outcome {
            Some(outcome) => {
                if let Some(handle) = self.handle.take() {
                    let _ = handle.join();
                }
                PollableState::Done(outcome)
            }
            None if finished => {
                // The worker died without publishing anything.
                self.handle = None;
                PollableState::Done(Err(StoreError::Unavailable("submission worker panicked".into())))
            }
            None => PollableState::Pending,
        }
    }

    /// Block until the submission finishes.
    #[cfg(test)]
    pub(crate) fn wait(mut self) -> SubmissionResult {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| Err(StoreError::Unavailable("submission worker panicked".into())))
    }
}

//! The survey page: the background and the form, driven by events.

mod events;
mod handlers;

pub(crate) use events::{Event, EventKind, EventTable, FieldEdit};

use crate::{
    background::{DrawingSurface, PetalAnimation},
    form::FormController,
    store::{DocumentStore, PendingSubmission, PollableState},
};
use fastrand::Rng;
use std::sync::Arc;

/// How the page's background is set up once the page is ready.
pub(crate) struct BackgroundOptions<S> {
    pub(crate) surface: S,
    /// Viewport units of width per petal.
    pub(crate) density: f32,
    pub(crate) rng: Rng,
}

/// Owns every piece of page state and routes events to their handlers.
pub(crate) struct Page<S> {
    controller: FormController,
    animation: Option<PetalAnimation<S>>,
    background: Option<BackgroundOptions<S>>,
    store: Arc<dyn DocumentStore>,
    collection: String,
    pending: Option<PendingSubmission>,
    alert: Option<String>,
    table: EventTable<S>,
}

impl<S: DrawingSurface> Page<S> {
    pub(crate) fn new(
        controller: FormController,
        background: BackgroundOptions<S>,
        store: Arc<dyn DocumentStore>,
        collection: String,
        table: EventTable<S>,
    ) -> Self {
        Self {
            controller,
            animation: None,
            background: Some(background),
            store,
            collection,
            pending: None,
            alert: None,
            table,
        }
    }

    /// Route an event to its handler.
    pub(crate) fn dispatch(&mut self, event: Event) {
        let kind = EventKind::from(&event);
        if self.alert.is_some() && kind.blocked_by_alert() {
            tracing::trace!(%kind, "event blocked by alert");
            return;
        }
        match self.table.handler(kind) {
            Some(handler) => handler(self, event),
            None => tracing::trace!(%kind, "no handler registered"),
        }
    }

    /// Check on the in-flight submission, returning its completion event once it finishes.
    pub(crate) fn poll_submission(&mut self) -> Option<Event> {
        match self.pending.as_mut()?.poll() {
            PollableState::Pending => None,
            PollableState::Done(outcome) => Some(Event::SubmissionSettled(outcome)),
        }
    }

    pub(crate) fn controller(&self) -> &FormController {
        &self.controller
    }

    pub(crate) fn controller_mut(&mut self) -> &mut FormController {
        &mut self.controller
    }

    pub(crate) fn animation(&self) -> Option<&PetalAnimation<S>> {
        self.animation.as_ref()
    }

    /// The message of the alert currently blocking the page, if any.
    pub(crate) fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub(crate) fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }
}

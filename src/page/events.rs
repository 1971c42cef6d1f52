use super::{Page, handlers};
use crate::{
    background::{DrawingSurface, Viewport},
    store::{DocumentId, StoreError},
};
use std::collections::HashMap;
use strum::EnumDiscriminants;

/// An edit to a form field.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldEdit {
    SetText(String),
    Choose(usize),
    Toggle(usize),
}

/// Everything that can happen to the page.
#[derive(Debug, EnumDiscriminants)]
#[strum_discriminants(name(EventKind), derive(Hash, strum::Display))]
pub(crate) enum Event {
    /// The page is ready to be shown in a viewport of the given size.
    PageReady(Viewport),
    /// The display is ready for a new frame.
    FrameTick,
    Resize(Viewport),
    Advance,
    Retreat,
    FieldEdited { field: String, edit: FieldEdit },
    SliderChanged { field: String, value: i64 },
    Submit,
    /// A submission finished.
    SubmissionSettled(Result<DocumentId, StoreError>),
    DismissAlert,
}

impl EventKind {
    /// Whether an open alert swallows events of this kind.
    pub(crate) fn blocked_by_alert(self) -> bool {
        matches!(
            self,
            Self::Advance | Self::Retreat | Self::FieldEdited | Self::SliderChanged | Self::Submit
        )
    }
}

pub(crate) type Handler<S> = fn(&mut Page<S>, Event);

/// Maps each kind of event to the function that handles it.
pub(crate) struct EventTable<S> {
    handlers: HashMap<EventKind, Handler<S>>,
}

impl<S: DrawingSurface> EventTable<S> {
    /// A table that handles nothing.
    pub(crate) fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register the handler for a kind of event, replacing any existing one.
    pub(crate) fn on(mut self, kind: EventKind, handler: Handler<S>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub(crate) fn handler(&self, kind: EventKind) -> Option<Handler<S>> {
        self.handlers.get(&kind).copied()
    }
}

impl<S: DrawingSurface> Default for EventTable<S> {
    fn default() -> Self {
        Self::empty()
            .on(EventKind::PageReady, handlers::page_ready)
            .on(EventKind::FrameTick, handlers::frame_tick)
            .on(EventKind::Resize, handlers::resize)
            .on(EventKind::Advance, handlers::advance)
            .on(EventKind::Retreat, handlers::retreat)
            .on(EventKind::FieldEdited, handlers::field_edited)
            .on(EventKind::SliderChanged, handlers::slider_changed)
            .on(EventKind::Submit, handlers::submit)
            .on(EventKind::SubmissionSettled, handlers::submission_settled)
            .on(EventKind::DismissAlert, handlers::dismiss_alert)
    }
}

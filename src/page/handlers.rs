use super::{
    Page,
    events::{Event, FieldEdit},
};
use crate::{
    background::{DrawingSurface, PetalAnimation},
    store::PendingSubmission,
};

pub(super) const SUBMIT_FAILED_ALERT: &str = "There was an error submitting your response. Please try again later.";

pub(super) fn page_ready<S: DrawingSurface>(page: &mut Page<S>, event: Event) {
    let Event::PageReady(viewport) = event else { return };
    if page.animation.is_some() {
        return;
    }
    let Some(background) = page.background.take() else { return };
    page.animation =
        Some(PetalAnimation::initialize(background.surface, viewport, background.density, background.rng));
    page.controller.render();
}

pub(super) fn frame_tick<S: DrawingSurface>(page: &mut Page<S>, _: Event) {
    if let Some(animation) = &mut page.animation {
        animation.tick();
    }
}

pub(super) fn resize<S: DrawingSurface>(page: &mut Page<S>, event: Event) {
    let Event::Resize(viewport) = event else { return };
    if let Some(animation) = &mut page.animation {
        tracing::debug!(from = ?animation.viewport(), to = ?viewport, "resizing background");
        animation.resize(viewport);
    }
}

pub(super) fn advance<S: DrawingSurface>(page: &mut Page<S>, _: Event) {
    page.controller.advance();
}

pub(super) fn retreat<S: DrawingSurface>(page: &mut Page<S>, _: Event) {
    page.controller.retreat();
}

pub(super) fn field_edited<S: DrawingSurface>(page: &mut Page<S>, event: Event) {
    let Event::FieldEdited { field, edit } = event else { return };
    match edit {
        FieldEdit::SetText(text) => page.controller.set_text(&field, text),
        FieldEdit::Choose(option) => page.controller.choose(&field, option),
        FieldEdit::Toggle(option) => page.controller.toggle(&field, option),
    }
}

pub(super) fn slider_changed<S: DrawingSurface>(page: &mut Page<S>, event: Event) {
    let Event::SliderChanged { field, value } = event else { return };
    page.controller.record_slider_change(&field, value);
}

pub(super) fn submit<S: DrawingSurface>(page: &mut Page<S>, _: Event) {
    if page.controller.is_submitted() {
        return;
    }
    if page.pending.is_some() {
        tracing::debug!("ignoring submit while another one is in flight");
        return;
    }
    let response = page.controller.collect_response();
    tracing::info!(collection = %page.collection, fields = response.len(), "submitting response");
    page.pending = Some(PendingSubmission::start(page.store.clone(), page.collection.clone(), response));
}

pub(super) fn submission_settled<S: DrawingSurface>(page: &mut Page<S>, event: Event) {
    let Event::SubmissionSettled(outcome) = event else { return };
    page.pending = None;
    match outcome {
        Ok(id) => {
            tracing::info!(%id, collection = %page.collection, "response saved");
            page.controller.mark_submitted();
        }
        Err(e) => {
            tracing::error!(error = %e, "saving response failed");
            page.alert = Some(SUBMIT_FAILED_ALERT.to_string());
        }
    }
}

pub(super) fn dismiss_alert<S: DrawingSurface>(page: &mut Page<S>, _: Event) {
    page.alert = None;
}

//! The multi-section survey form.

mod controller;
mod progress;
mod response;
mod structure;

pub(crate) use controller::{FieldState, FormController};
pub(crate) use response::{CollectedResponse, FieldValue, SUBMITTED_AT_FIELD};
pub(crate) use structure::{Field, FieldKind, FormStructure};

use super::{
    progress::Progress,
    response::{CollectedResponse, FieldValue, SUBMITTED_AT_FIELD},
    structure::{Field, FieldKind, FormStructure, Section},
};
use std::collections::HashMap;

/// The value currently entered in a field.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldState {
    Text(String),
    /// The index of the selected option, if any.
    Choice(Option<usize>),
    /// Whether each option is checked, in declaration order.
    Checks(Vec<bool>),
    Slider(i64),
}

impl FieldState {
    fn initial(field: &Field) -> Self {
        match &field.kind {
            FieldKind::Text => Self::Text(String::new()),
            FieldKind::SingleChoice { .. } => Self::Choice(None),
            FieldKind::MultiChoice { options } => Self::Checks(vec![false; options.len()]),
            FieldKind::Slider { min, max, default } => Self::Slider(default.unwrap_or(min.midpoint(*max))),
        }
    }
}

/// Drives a multi-section form: which section is shown, the progress indicator and the
/// values entered so far.
#[derive(Debug)]
pub(crate) struct FormController {
    structure: FormStructure,
    current: usize,
    visible: Vec<bool>,
    progress: Progress,
    values: HashMap<String, FieldState>,
    slider_displays: HashMap<String, String>,
    submitted: bool,
    scroll_requested: bool,
}

impl FormController {
    pub(crate) fn new(structure: FormStructure) -> Self {
        let values: HashMap<_, _> =
            structure.fields().map(|field| (field.name.clone(), FieldState::initial(field))).collect();
        let slider_displays = values
            .iter()
            .filter_map(|(name, state)| match state {
                FieldState::Slider(value) => Some((name.clone(), value.to_string())),
                _ => None,
            })
            .collect();
        let total = structure.total_sections();
        let mut controller = Self {
            progress: Progress::at(1, total, &structure.labels),
            visible: vec![false; total],
            structure,
            current: 1,
            values,
            slider_displays,
            submitted: false,
            scroll_requested: false,
        };
        controller.render();
        controller
    }

    pub(crate) fn structure(&self) -> &FormStructure {
        &self.structure
    }

    /// The 1-based index of the section being shown.
    pub(crate) fn current_section(&self) -> usize {
        self.current
    }

    pub(crate) fn total_sections(&self) -> usize {
        self.visible.len()
    }

    pub(crate) fn section(&self) -> Option<&Section> {
        self.structure.sections.get(self.current - 1)
    }

    /// Whether the 1-based section is visible.
    pub(crate) fn is_visible(&self, section: usize) -> bool {
        section.checked_sub(1).and_then(|index| self.visible.get(index)).copied().unwrap_or(false)
    }

    pub(crate) fn progress(&self) -> &Progress {
        &self.progress
    }

    pub(crate) fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub(crate) fn is_last_section(&self) -> bool {
        self.current == self.total_sections()
    }

    pub(crate) fn field_state(&self, name: &str) -> Option<&FieldState> {
        self.values.get(name)
    }

    /// The text shown next to a slider.
    pub(crate) fn slider_display(&self, name: &str) -> Option<&str> {
        self.slider_displays.get(name).map(String::as_str)
    }

    /// Returns whether a scroll to the top of the current section was requested since the
    /// last call.
    pub(crate) fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Move to the next section. Returns whether the section changed.
    pub(crate) fn advance(&mut self) -> bool {
        if self.submitted || self.current >= self.total_sections() {
            return false;
        }
        self.current += 1;
        self.render();
        true
    }

    /// Move to the previous section. Returns whether the section changed.
    pub(crate) fn retreat(&mut self) -> bool {
        if self.submitted || self.current <= 1 {
            return false;
        }
        self.current -= 1;
        self.render();
        true
    }

    /// Show the current section only and update the progress indicator.
    pub(crate) fn render(&mut self) {
        for (index, visible) in self.visible.iter_mut().enumerate() {
            *visible = index + 1 == self.current;
        }
        self.progress = Progress::at(self.current, self.total_sections(), &self.structure.labels);
        self.scroll_requested = true;
        tracing::debug!(section = self.current, label = %self.progress.label, "rendered section");
    }

    /// Sync a slider's value and its display text.
    pub(crate) fn record_slider_change(&mut self, name: &str, value: i64) {
        let Some(FieldKind::Slider { min, max, .. }) = self.structure.field(name).map(|field| &field.kind) else {
            tracing::trace!(field = name, "ignoring change for unknown slider");
            return;
        };
        let value = value.clamp(*min, *max);
        self.values.insert(name.to_string(), FieldState::Slider(value));
        self.slider_displays.insert(name.to_string(), value.to_string());
    }

    pub(crate) fn set_text(&mut self, name: &str, text: String) {
        match self.values.get_mut(name) {
            Some(FieldState::Text(current)) => *current = text,
            _ => tracing::trace!(field = name, "ignoring text for unknown field"),
        }
    }

    /// Select an option of a single choice field.
    pub(crate) fn choose(&mut self, name: &str, option: usize) {
        let options = self.structure.field(name).map(|field| field.kind.options().len()).unwrap_or(0);
        match self.values.get_mut(name) {
            Some(FieldState::Choice(selected)) if option < options => *selected = Some(option),
            _ => tracing::trace!(field = name, option, "ignoring choice for unknown field"),
        }
    }

    /// Flip an option of a multiple choice field.
    pub(crate) fn toggle(&mut self, name: &str, option: usize) {
        match self.values.get_mut(name).and_then(|state| match state {
            FieldState::Checks(checks) => checks.get_mut(option),
            _ => None,
        }) {
            Some(checked) => *checked = !*checked,
            None => tracing::trace!(field = name, option, "ignoring toggle for unknown field"),
        }
    }

    /// Gather the values of every field across all sections.
    ///
    /// Multiple choice fields are collected as the list of checked values in the order the
    /// options are declared. Unanswered single choice fields are left out.
    pub(crate) fn collect_response(&self) -> CollectedResponse {
        let mut response = CollectedResponse::default();
        for field in self.structure.fields() {
            let Some(state) = self.values.get(&field.name) else {
                continue;
            };
            let options = field.kind.options();
            let value = match state {
                FieldState::Text(text) => FieldValue::Text(text.clone()),
                FieldState::Choice(Some(index)) => match options.get(*index) {
                    Some(option) => FieldValue::Text(option.value.clone()),
                    None => continue,
                },
                FieldState::Choice(None) => continue,
                FieldState::Checks(checks) => FieldValue::List(
                    options.iter().zip(checks).filter(|(_, checked)| **checked).map(|(o, _)| o.value.clone()).collect(),
                ),
                FieldState::Slider(value) => FieldValue::Number(*value),
            };
            response.insert(field.name.clone(), value);
        }
        response.insert(SUBMITTED_AT_FIELD, FieldValue::ServerTimestamp);
        response
    }

    /// Replace the form with the confirmation view.
    pub(crate) fn mark_submitted(&mut self) {
        if self.submitted {
            return;
        }
        self.submitted = true;
        self.visible.fill(false);
        self.progress = Progress::submitted(&self.structure.labels);
        self.scroll_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::structure::{ChoiceOption, ProgressLabels};
    use rstest::rstest;

    fn structure(sections: usize) -> FormStructure {
        let sections = (1..=sections)
            .map(|id| Section { id: Some(id), title: format!("section {id}"), fields: vec![] })
            .collect();
        FormStructure {
            title: "test".into(),
            intro: None,
            confirmation: "done".into(),
            labels: ProgressLabels::default(),
            sections,
        }
    }

    fn option(value: &str) -> ChoiceOption {
        ChoiceOption { value: value.into(), label: None }
    }

    fn survey() -> FormController {
        let mut structure = structure(2);
        structure.sections[0].fields = vec![
            Field { name: "name".into(), label: "Name".into(), kind: FieldKind::Text, samples: vec![] },
            Field {
                name: "year".into(),
                label: "Year".into(),
                kind: FieldKind::SingleChoice { options: vec![option("1st"), option("2nd")] },
                samples: vec![],
            },
        ];
        structure.sections[1].fields = vec![
            Field {
                name: "help".into(),
                label: "Help".into(),
                kind: FieldKind::MultiChoice { options: vec![option("A"), option("B"), option("C")] },
                samples: vec![],
            },
            Field {
                name: "mood".into(),
                label: "Mood".into(),
                kind: FieldKind::Slider { min: 1, max: 5, default: Some(3) },
                samples: vec![],
            },
        ];
        FormController::new(structure)
    }

    fn visible_count(controller: &FormController) -> usize {
        (1..=controller.total_sections()).filter(|s| controller.is_visible(*s)).count()
    }

    #[test]
    fn starts_on_first_section() {
        let mut controller = FormController::new(structure(3));
        assert_eq!(controller.current_section(), 1);
        assert!(controller.is_visible(1));
        assert_eq!(visible_count(&controller), 1);
        assert_eq!(controller.progress().fraction, 0.0);
        assert!(controller.take_scroll_request());
        assert!(!controller.take_scroll_request());
    }

    #[rstest]
    fn pointer_stays_in_bounds(#[values(1, 2, 3, 5, 6)] total: usize) {
        let mut controller = FormController::new(structure(total));
        // A fixed but irregular walk: mostly forward, with bursts backwards.
        let steps = "++-+++--+++++-------++++++++++-+";
        for step in steps.chars() {
            let before = controller.progress().fraction;
            if step == '+' {
                controller.advance();
                assert!(controller.progress().fraction >= before);
            } else {
                controller.retreat();
                assert!(controller.progress().fraction <= before);
            }
            assert!((1..=total).contains(&controller.current_section()));
            assert_eq!(visible_count(&controller), 1);
            assert!(controller.is_visible(controller.current_section()));
        }
    }

    #[test]
    fn bounds_are_idempotent() {
        let mut controller = FormController::new(structure(3));
        assert!(!controller.retreat());
        assert!(!controller.retreat());
        assert_eq!(controller.current_section(), 1);

        while controller.advance() {}
        assert_eq!(controller.current_section(), 3);
        assert!(!controller.advance());
        assert_eq!(controller.current_section(), 3);
    }

    #[test]
    fn five_sections() {
        let mut controller = FormController::new(structure(5));
        for _ in 0..4 {
            assert!(controller.advance());
        }
        assert_eq!(controller.current_section(), 5);
        assert_eq!(controller.progress().percentage(), 100);
        assert_eq!(controller.progress().label, ProgressLabels::default().final_step);

        assert!(!controller.advance());
        assert_eq!(controller.current_section(), 5);
    }

    #[test]
    fn single_section_is_complete() {
        let controller = FormController::new(structure(1));
        assert_eq!(controller.progress().fraction, 1.0);
        assert!(controller.is_last_section());
    }

    #[test]
    fn multi_choice_keeps_document_order() {
        let mut controller = survey();
        controller.toggle("help", 2);
        controller.toggle("help", 0);
        let response = controller.collect_response();
        assert_eq!(response.get("help"), Some(&FieldValue::List(vec!["A".into(), "C".into()])));
    }

    #[test]
    fn collects_all_sections() {
        let mut controller = survey();
        controller.set_text("name", "Ada".into());
        controller.choose("year", 1);
        controller.record_slider_change("mood", 4);
        assert_eq!(controller.current_section(), 1);

        let response = controller.collect_response();
        assert_eq!(response.get("name"), Some(&FieldValue::Text("Ada".into())));
        assert_eq!(response.get("year"), Some(&FieldValue::Text("2nd".into())));
        assert_eq!(response.get("mood"), Some(&FieldValue::Number(4)));
        assert_eq!(response.get("help"), Some(&FieldValue::List(vec![])));
        assert_eq!(response.get(SUBMITTED_AT_FIELD), Some(&FieldValue::ServerTimestamp));
        assert_eq!(response.len(), 5);
    }

    #[test]
    fn unanswered_choice_is_omitted() {
        let response = survey().collect_response();
        assert_eq!(response.get("year"), None);
        assert_eq!(response.get("name"), Some(&FieldValue::Text(String::new())));
    }

    #[test]
    fn slider_display_tracks_value() {
        let mut controller = survey();
        assert_eq!(controller.slider_display("mood"), Some("3"));
        controller.record_slider_change("mood", 5);
        assert_eq!(controller.slider_display("mood"), Some("5"));
        controller.record_slider_change("mood", 42);
        assert_eq!(controller.slider_display("mood"), Some("5"));
        assert_eq!(controller.field_state("mood"), Some(&FieldState::Slider(5)));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut controller = survey();
        let before = controller.collect_response();
        controller.record_slider_change("missing", 1);
        controller.record_slider_change("name", 1);
        controller.set_text("missing", "x".into());
        controller.set_text("mood", "x".into());
        controller.choose("year", 9);
        controller.toggle("help", 9);
        controller.toggle("name", 0);
        assert_eq!(controller.collect_response(), before);
        assert_eq!(controller.slider_display("missing"), None);
    }

    #[test]
    fn submission_hides_sections() {
        let mut controller = survey();
        controller.advance();
        controller.mark_submitted();
        assert!(controller.is_submitted());
        assert_eq!(visible_count(&controller), 0);
        assert_eq!(controller.progress().percentage(), 100);
        assert_eq!(controller.progress().label, ProgressLabels::default().submitted);
        assert!(!controller.retreat());
        assert_eq!(controller.current_section(), 2);
    }

    #[test]
    fn extreme_slider_bounds() {
        let mut structure = structure(1);
        structure.sections[0].fields = vec![Field {
            name: "wide".into(),
            label: "Wide".into(),
            kind: FieldKind::Slider { min: i64::MIN, max: i64::MAX, default: None },
            samples: vec![],
        }];
        let mut controller = FormController::new(structure);
        assert_eq!(controller.field_state("wide"), Some(&FieldState::Slider(0)));

        controller.record_slider_change("wide", i64::MAX);
        assert_eq!(controller.field_state("wide"), Some(&FieldState::Slider(i64::MAX)));
    }
}

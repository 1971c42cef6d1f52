use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

const DEFAULT_SURVEY: &str = include_str!("surveys/default.yaml");

/// The declared structure of a survey: its ordered sections and their fields.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub(crate) struct FormStructure {
    pub(crate) title: String,

    #[serde(default)]
    pub(crate) intro: Option<String>,

    /// The message shown once a response has been submitted.
    #[serde(default = "default_confirmation")]
    pub(crate) confirmation: String,

    #[serde(default)]
    pub(crate) labels: ProgressLabels,

    pub(crate) sections: Vec<Section>,
}

fn default_confirmation() -> String {
    "Your response has been recorded.".to_string()
}

/// The text shown next to the progress bar.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ProgressLabels {
    /// Shown on the first section.
    pub(crate) begin: String,

    /// Shown on the last section.
    pub(crate) final_step: String,

    /// Shown once the response is submitted.
    pub(crate) submitted: String,
}

impl Default for ProgressLabels {
    fn default() -> Self {
        Self {
            begin: "Let's begin your story...".into(),
            final_step: "Final step, almost done!".into(),
            submitted: "Thank you for your voice!".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub(crate) struct Section {
    /// The 1-based ordinal of this section. Assigned from its position when missing.
    #[serde(default)]
    pub(crate) id: Option<usize>,

    pub(crate) title: String,

    #[serde(default)]
    pub(crate) fields: Vec<Field>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
pub(crate) struct Field {
    pub(crate) name: String,

    pub(crate) label: String,

    #[serde(flatten)]
    pub(crate) kind: FieldKind,

    /// Example answers, only used when generating sample data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) samples: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub(crate) enum FieldKind {
    Text,
    SingleChoice { options: Vec<ChoiceOption> },
    MultiChoice { options: Vec<ChoiceOption> },
    Slider { min: i64, max: i64, default: Option<i64> },
}

impl FieldKind {
    pub(crate) fn options(&self) -> &[ChoiceOption] {
        match self {
            Self::SingleChoice { options } | Self::MultiChoice { options } => options,
            Self::Text | Self::Slider { .. } => &[],
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[cfg_attr(feature = "json-schema", derive(schemars::JsonSchema))]
#[serde(deny_unknown_fields)]
pub(crate) struct ChoiceOption {
    pub(crate) value: String,

    #[serde(default)]
    pub(crate) label: Option<String>,
}

impl ChoiceOption {
    pub(crate) fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

impl FormStructure {
    /// The survey shipped with the binary.
    pub(crate) fn builtin() -> Result<Self, StructureError> {
        Self::from_yaml(DEFAULT_SURVEY)
    }

    pub(crate) fn load(path: &Path) -> Result<Self, StructureError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub(crate) fn from_yaml(contents: &str) -> Result<Self, StructureError> {
        let mut structure: Self = serde_yaml::from_str(contents)?;
        structure.normalize()?;
        Ok(structure)
    }

    pub(crate) fn total_sections(&self) -> usize {
        self.sections.len()
    }

    /// Iterate every field in document order.
    pub(crate) fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|section| section.fields.iter())
    }

    pub(crate) fn field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|field| field.name == name)
    }

    fn normalize(&mut self) -> Result<(), StructureError> {
        if self.sections.is_empty() {
            return Err(StructureError::NoSections);
        }
        for (index, section) in self.sections.iter_mut().enumerate() {
            let position = index + 1;
            match section.id {
                Some(id) if id != position => {
                    return Err(StructureError::SectionOutOfOrder { id, position });
                }
                _ => section.id = Some(position),
            }
        }

        let mut names = HashSet::new();
        for field in self.fields() {
            if !names.insert(field.name.as_str()) {
                return Err(StructureError::DuplicateField(field.name.clone()));
            }
            match &field.kind {
                FieldKind::SingleChoice { options } | FieldKind::MultiChoice { options } if options.is_empty() => {
                    return Err(StructureError::NoOptions(field.name.clone()));
                }
                FieldKind::Slider { min, max, default } => {
                    if min > max {
                        return Err(StructureError::InvalidRange(field.name.clone()));
                    }
                    if default.is_some_and(|value| value < *min || value > *max) {
                        return Err(StructureError::InvalidRange(field.name.clone()));
                    }
                }
                _ => (),
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StructureError {
    #[error("reading survey: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid survey: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("survey has no sections")]
    NoSections,

    #[error("section with id {id} is declared in position {position}")]
    SectionOutOfOrder { id: usize, position: usize },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("choice field '{0}' has no options")]
    NoOptions(String),

    #[error("slider '{0}' has an invalid range")]
    InvalidRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn builtin_survey_is_valid() {
        let structure = FormStructure::builtin().expect("invalid builtin survey");
        assert_eq!(structure.total_sections(), 5);
        let ids: Vec<_> = structure.sections.iter().filter_map(|s| s.id).collect();
        assert_eq!(ids, [1, 2, 3, 4, 5]);
        let help = structure.field("help").expect("no help field");
        assert!(matches!(help.kind, FieldKind::MultiChoice { .. }));
        assert_eq!(help.kind.options().len(), 6);
    }

    #[test]
    fn parse_field_kinds() {
        let input = r#"
title: test
sections:
  - title: one
    fields:
      - name: a
        label: A
        kind: text
      - name: b
        label: B
        kind: single-choice
        options: [{ value: x, label: Ex }, { value: y }]
      - name: c
        label: C
        kind: slider
        min: 1
        max: 5
"#;
        let structure = FormStructure::from_yaml(input).expect("parse failed");
        let kinds: Vec<_> = structure.fields().map(|f| &f.kind).collect();
        assert_eq!(kinds[0], &FieldKind::Text);
        assert_eq!(kinds[1].options()[0].label(), "Ex");
        assert_eq!(kinds[1].options()[1].label(), "y");
        assert_eq!(kinds[2], &FieldKind::Slider { min: 1, max: 5, default: None });
        assert_eq!(structure.labels, ProgressLabels::default());
    }

    #[rstest]
    #[case::no_sections("title: t\nsections: []")]
    #[case::out_of_order("title: t\nsections:\n  - { id: 2, title: s }")]
    #[case::duplicate(
        "title: t\nsections:\n  - { title: s, fields: [{ name: a, label: a, kind: text }, { name: a, label: a, kind: text }] }"
    )]
    #[case::no_options("title: t\nsections:\n  - { title: s, fields: [{ name: a, label: a, kind: multi-choice, options: [] }] }")]
    #[case::inverted_range(
        "title: t\nsections:\n  - { title: s, fields: [{ name: a, label: a, kind: slider, min: 5, max: 1 }] }"
    )]
    #[case::default_out_of_range(
        "title: t\nsections:\n  - { title: s, fields: [{ name: a, label: a, kind: slider, min: 1, max: 5, default: 9 }] }"
    )]
    #[case::unknown_kind("title: t\nsections:\n  - { title: s, fields: [{ name: a, label: a, kind: date }] }")]
    fn invalid_structures(#[case] input: &str) {
        assert!(FormStructure::from_yaml(input).is_err());
    }
}

use super::structure::ProgressLabels;

/// The state of the progress indicator.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Progress {
    /// How far along the form the user is, between 0 and 1.
    pub(crate) fraction: f32,
    pub(crate) label: String,
}

impl Progress {
    /// Compute the progress for the given 1-based section out of `total`.
    pub(crate) fn at(section: usize, total: usize, labels: &ProgressLabels) -> Self {
        let fraction = if total <= 1 { 1.0 } else { (section.saturating_sub(1)) as f32 / (total - 1) as f32 };
        let label = if section == 1 {
            labels.begin.clone()
        } else if section == total {
            labels.final_step.clone()
        } else {
            format!("Section {section} of {total}")
        };
        Self { fraction, label }
    }

    pub(crate) fn submitted(labels: &ProgressLabels) -> Self {
        Self { fraction: 1.0, label: labels.submitted.clone() }
    }

    pub(crate) fn percentage(&self) -> u8 {
        (self.fraction * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 5, 0.0, "Let's begin your story...")]
    #[case(2, 5, 0.25, "Section 2 of 5")]
    #[case(3, 5, 0.5, "Section 3 of 5")]
    #[case(5, 5, 1.0, "Final step, almost done!")]
    #[case(1, 1, 1.0, "Let's begin your story...")]
    #[case(2, 2, 1.0, "Final step, almost done!")]
    fn progress(#[case] section: usize, #[case] total: usize, #[case] fraction: f32, #[case] label: &str) {
        let progress = Progress::at(section, total, &ProgressLabels::default());
        assert_eq!(progress.fraction, fraction);
        assert_eq!(progress.label, label);
    }

    #[test]
    fn percentage_rounds() {
        let progress = Progress::at(2, 4, &ProgressLabels::default());
        assert_eq!(progress.percentage(), 33);
        assert_eq!(Progress::submitted(&ProgressLabels::default()).percentage(), 100);
    }
}

//! Template merging and reset for authoring forms.
//!
//! Pipeline: Template → Candidate extraction → Fill pass → Append pass → New form
//!
//! Every collection is merged independently and the results are assembled
//! into a single new [`FormState`]; the input form is never mutated.

mod candidates;
mod lookup;
mod merge;
mod reset;

pub use candidates::*;
pub use lookup::*;
pub use merge::*;
pub use reset::*;

use tracing::debug;

use crate::models::{today, FormState, Template};

/// Per-collection statistics of one template application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub symptoms: MergeStats,
    pub diagnoses: MergeStats,
    pub medicines: MergeStats,
    pub vaccines: MergeStats,
    pub lab_tests: MergeStats,
    /// Whether the template's instructions were taken
    pub instructions_filled: bool,
}

/// Applies templates to forms, resolving references through `L`.
pub struct TemplateMergeEngine<L> {
    lookup: L,
    today: String,
}

impl<L: ReferenceLookup> TemplateMergeEngine<L> {
    /// Create an engine dating new rows with the current local date.
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            today: today(),
        }
    }

    /// Use a fixed date for rows created by the merge.
    pub fn with_today(mut self, today: impl Into<String>) -> Self {
        self.today = today.into();
        self
    }

    /// Merge `template` into `current` and return the new form.
    pub fn apply(&self, current: &FormState, template: &Template) -> FormState {
        self.apply_with_report(current, template).0
    }

    /// [`apply`](Self::apply), also reporting what changed per collection.
    pub fn apply_with_report(
        &self,
        current: &FormState,
        template: &Template,
    ) -> (FormState, MergeReport) {
        let candidates = extract(template, &self.lookup, &self.today);

        let (symptoms, symptom_stats) =
            fill_then_append(&current.symptoms, candidates.symptoms, false);
        let (diagnoses, diagnosis_stats) =
            fill_then_append(&current.diagnoses, candidates.diagnoses, false);
        let (medicines, medicine_stats) =
            fill_then_append(&current.medicines, candidates.medicines, true);
        let (vaccines, vaccine_stats) =
            fill_then_append(&current.vaccines, candidates.vaccines, false);
        let (lab_tests, lab_test_stats) =
            fill_then_append(&current.lab_tests, candidates.lab_tests, false);

        let instructions_filled =
            current.instructions.trim().is_empty() && !template.instructions.is_empty();
        let instructions = if current.instructions.trim().is_empty() {
            template.instructions.clone()
        } else {
            current.instructions.clone()
        };

        let mut visibility = current.visibility;
        visibility.vaccines |= vaccine_stats.contributed() > 0;
        visibility.lab_tests |= lab_test_stats.contributed() > 0;

        let report = MergeReport {
            symptoms: symptom_stats,
            diagnoses: diagnosis_stats,
            medicines: medicine_stats,
            vaccines: vaccine_stats,
            lab_tests: lab_test_stats,
            instructions_filled,
        };
        debug!(template_id = %template.id, ?report, "applied template");

        let merged = FormState {
            symptoms,
            diagnoses,
            medicines,
            vaccines,
            lab_tests,
            attachments: current.attachments.clone(),
            instructions,
            payment: current.payment.clone(),
            visibility,
        };
        (merged, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TemplateItem, TemplateMedicine};

    const TODAY: &str = "2024-03-01";

    fn engine() -> TemplateMergeEngine<ReferenceTable> {
        TemplateMergeEngine::new(ReferenceTable::new()).with_today(TODAY)
    }

    #[test]
    fn test_instructions_only_filled_when_blank() {
        let mut template = Template::new("t1", "Flu");
        template.instructions = "Drink fluids".into();

        let blank = FormState::new(TODAY);
        assert_eq!(engine().apply(&blank, &template).instructions, "Drink fluids");

        let mut typed = FormState::new(TODAY);
        typed.instructions = "  Keep warm ".into();
        assert_eq!(engine().apply(&typed, &template).instructions, "  Keep warm ");
    }

    #[test]
    fn test_visibility_forced_on_only_by_contribution() {
        let mut template = Template::new("t1", "Travel");
        template.vaccines.push(TemplateItem::new("V1", "Typhoid"));

        let merged = engine().apply(&FormState::new(TODAY), &template);
        assert!(merged.visibility.vaccines);
        assert!(!merged.visibility.lab_tests);

        let mut shown = FormState::new(TODAY);
        shown.visibility.lab_tests = true;
        let merged = engine().apply(&shown, &Template::new("t2", "Empty"));
        assert!(merged.visibility.lab_tests);
    }

    #[test]
    fn test_report_counts() {
        let mut template = Template::new("t1", "Mixed");
        template.symptoms_text = "Cough, Fever".into();
        template.medicines = vec![
            TemplateMedicine {
                sku: "M1".into(),
                name: "A".into(),
                ..Default::default()
            },
            TemplateMedicine {
                sku: "M1".into(),
                name: "A again".into(),
                ..Default::default()
            },
        ];

        let (merged, report) = engine().apply_with_report(&FormState::new(TODAY), &template);

        assert_eq!(report.symptoms, MergeStats { filled: 1, appended: 1, skipped_duplicates: 0 });
        assert_eq!(report.medicines, MergeStats { filled: 1, appended: 0, skipped_duplicates: 1 });
        assert!(!report.instructions_filled);
        assert_eq!(merged.medicines.len(), 1);
    }

    #[test]
    fn test_input_form_untouched() {
        let current = FormState::new(TODAY);
        let snapshot = current.clone();
        let mut template = Template::new("t1", "Cold");
        template.symptoms_text = "Cough".into();

        let _ = engine().apply(&current, &template);
        assert_eq!(current, snapshot);
    }
}

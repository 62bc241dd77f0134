//! Authoring form state.

use serde::{Deserialize, Serialize};

use super::rows::{DiagnosisRow, LabTestRow, MedicineRow, SymptomRow, VaccineRow};

/// Today's date as the form stores it (`YYYY-MM-DD`, local time).
pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// A file attached to the form. Encoding happens outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

/// Payment fields of the form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentFields {
    pub mode: Option<String>,
    pub amount: Option<f64>,
    pub paid: bool,
}

/// Which optional sections are shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SectionVisibility {
    pub vaccines: bool,
    pub lab_tests: bool,
}

/// Full state of one in-progress clinical form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub symptoms: Vec<SymptomRow>,
    pub diagnoses: Vec<DiagnosisRow>,
    pub medicines: Vec<MedicineRow>,
    pub vaccines: Vec<VaccineRow>,
    pub lab_tests: Vec<LabTestRow>,
    pub attachments: Vec<Attachment>,
    pub instructions: String,
    pub payment: PaymentFields,
    pub visibility: SectionVisibility,
}

impl FormState {
    /// Initial form: one blank symptom, diagnosis and medicine row each.
    pub fn new(today: &str) -> Self {
        Self {
            symptoms: vec![SymptomRow::blank(today)],
            diagnoses: vec![DiagnosisRow::blank(today)],
            medicines: vec![MedicineRow::blank()],
            vaccines: Vec::new(),
            lab_tests: Vec::new(),
            attachments: Vec::new(),
            instructions: String::new(),
            payment: PaymentFields::default(),
            visibility: SectionVisibility::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for FormState {
    fn default() -> Self {
        Self::new(&today())
    }
}

/// Lifecycle of a stored form draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    /// Being edited
    Open,
    /// Handed off to the prescription workflow
    Submitted,
}

/// A form persisted locally between edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDraft {
    pub draft_id: String,
    /// Specialty whose catalog the form is authored against
    pub specialty_id: Option<String>,
    pub form: FormState,
    pub status: DraftStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl FormDraft {
    /// New open draft holding an initial form.
    pub fn new(specialty_id: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            draft_id: uuid::Uuid::new_v4().to_string(),
            specialty_id,
            form: FormState::default(),
            status: DraftStatus::Open,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

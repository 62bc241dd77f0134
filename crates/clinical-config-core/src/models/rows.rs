//! Form row models.
//!
//! Each collection of a clinical form is an ordered list of one row kind.
//! Every kind knows when it counts as an empty slot, which is what the
//! template merge fills before appending.

use serde::{Deserialize, Serialize};

use super::catalog::ItemRef;

/// Behavior shared by all row kinds.
pub trait Row: Clone {
    /// Stable identity of the row within its form.
    fn id(&self) -> &str;

    /// Whether the row is an empty slot a template may fill.
    fn is_empty(&self) -> bool;

    /// Copy the fields a template candidate carries into this row.
    /// The row keeps its own id.
    fn absorb(&mut self, candidate: Self);

    /// SKU used for duplicate suppression, if the row has one.
    fn sku(&self) -> Option<&str> {
        None
    }
}

fn new_row_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// A symptom line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SymptomRow {
    pub id: String,
    pub symptom: String,
    pub frequency: String,
    pub severity: String,
    pub date: String,
    pub duration: String,
}

impl SymptomRow {
    /// Blank row dated `today`.
    pub fn blank(today: &str) -> Self {
        Self {
            id: new_row_id(),
            symptom: String::new(),
            frequency: String::new(),
            severity: String::new(),
            date: today.to_string(),
            duration: String::new(),
        }
    }

    pub fn with_symptom(symptom: impl Into<String>, today: &str) -> Self {
        Self {
            symptom: symptom.into(),
            ..Self::blank(today)
        }
    }
}

impl Row for SymptomRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_empty(&self) -> bool {
        is_blank(&self.symptom)
    }

    fn absorb(&mut self, candidate: Self) {
        // Candidates carry only the symptom and its date.
        self.symptom = candidate.symptom;
        self.date = candidate.date;
    }
}

/// A diagnosis line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisRow {
    pub id: String,
    pub diagnosis: String,
    pub date: String,
    pub duration: String,
}

impl DiagnosisRow {
    pub fn blank(today: &str) -> Self {
        Self {
            id: new_row_id(),
            diagnosis: String::new(),
            date: today.to_string(),
            duration: String::new(),
        }
    }

    pub fn with_diagnosis(diagnosis: impl Into<String>, today: &str) -> Self {
        Self {
            diagnosis: diagnosis.into(),
            ..Self::blank(today)
        }
    }
}

impl Row for DiagnosisRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_empty(&self) -> bool {
        is_blank(&self.diagnosis)
    }

    fn absorb(&mut self, candidate: Self) {
        self.diagnosis = candidate.diagnosis;
        self.date = candidate.date;
    }
}

/// A prescribed medicine line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRow {
    pub id: String,
    pub medicine_ref: Option<ItemRef>,
    pub dose: String,
    pub when: String,
    pub frequency: String,
    pub duration: String,
    pub notes: String,
    pub sku: String,
}

impl MedicineRow {
    pub fn blank() -> Self {
        Self {
            id: new_row_id(),
            ..Default::default()
        }
    }
}

impl Row for MedicineRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.medicine_ref.is_none()
    }

    fn absorb(&mut self, candidate: Self) {
        let id = std::mem::take(&mut self.id);
        *self = Self { id, ..candidate };
    }

    fn sku(&self) -> Option<&str> {
        non_blank(&self.sku).or_else(|| {
            self.medicine_ref
                .as_ref()
                .and_then(|reference| non_blank(&reference.sku))
        })
    }
}

/// A vaccine line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VaccineRow {
    pub id: String,
    pub vaccine_ref: Option<ItemRef>,
    pub notes: String,
    pub sku: String,
}

impl VaccineRow {
    pub fn blank() -> Self {
        Self {
            id: new_row_id(),
            ..Default::default()
        }
    }
}

impl Row for VaccineRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.vaccine_ref.is_none()
    }

    fn absorb(&mut self, candidate: Self) {
        let id = std::mem::take(&mut self.id);
        *self = Self { id, ..candidate };
    }

    fn sku(&self) -> Option<&str> {
        non_blank(&self.sku)
    }
}

/// A lab test order line.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabTestRow {
    pub id: String,
    pub lab_test_ref: Option<ItemRef>,
    pub notes: String,
    pub sku: String,
}

impl LabTestRow {
    pub fn blank() -> Self {
        Self {
            id: new_row_id(),
            ..Default::default()
        }
    }
}

impl Row for LabTestRow {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_empty(&self) -> bool {
        self.lab_test_ref.is_none()
    }

    fn absorb(&mut self, candidate: Self) {
        let id = std::mem::take(&mut self.id);
        *self = Self { id, ..candidate };
    }

    fn sku(&self) -> Option<&str> {
        non_blank(&self.sku)
    }
}

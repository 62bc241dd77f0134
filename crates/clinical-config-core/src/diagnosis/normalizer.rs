//! Diagnosis list normalizer.
//!
//! Handles:
//! - Name trimming
//! - Symptom trimming and blank removal
//! - Exact (case-sensitive) symptom deduplication within one entry

use crate::models::{Diagnosis, RawDiagnosis};

use super::{DiagnosisError, DiagnosisResult};

/// Normalizer for raw diagnosis lists.
#[derive(Debug, Default, Clone, Copy)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize every entry. Fails on the first entry without a name.
    pub fn normalize(&self, raw: &[RawDiagnosis]) -> DiagnosisResult<Vec<Diagnosis>> {
        raw.iter()
            .enumerate()
            .map(|(index, entry)| self.normalize_entry(index, entry))
            .collect()
    }

    /// Normalize one entry; `index` is reported back on failure.
    pub fn normalize_entry(&self, index: usize, raw: &RawDiagnosis) -> DiagnosisResult<Diagnosis> {
        let name = raw
            .name
            .as_deref()
            .ok_or(DiagnosisError::MissingName { index })?;

        let mut diagnosis = Diagnosis::new(name.trim());
        for symptom in &raw.symptoms {
            diagnosis.push_symptom(symptom);
        }
        Ok(diagnosis)
    }
}

/// Normalize a raw list with the default normalizer.
pub fn normalize(raw: &[RawDiagnosis]) -> DiagnosisResult<Vec<Diagnosis>> {
    Normalizer::new().normalize(raw)
}

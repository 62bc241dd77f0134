//! Diagnosis catalog cleaning.
//!
//! Pipeline: Raw list → Normalization → Deduplication → Persistence

mod deduper;
mod normalizer;

pub use deduper::*;
pub use normalizer::*;

use crate::models::{Diagnosis, RawDiagnosis};
use thiserror::Error;

/// Validation errors raised before anything is sent to the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosisError {
    #[error("Diagnosis at position {index} has no name")]
    MissingName { index: usize },

    #[error("Diagnosis name is blank")]
    BlankName,

    #[error("Symptom is blank")]
    BlankSymptom,
}

pub type DiagnosisResult<T> = Result<T, DiagnosisError>;

/// Normalize then dedupe a raw diagnosis list.
pub fn clean(raw: &[RawDiagnosis]) -> DiagnosisResult<Vec<Diagnosis>> {
    let normalized = normalize(raw)?;
    Ok(dedupe(&normalized))
}

/// [`clean`] for outgoing catalogs: additionally rejects names that are
/// blank after trimming.
pub fn clean_for_save(raw: &[RawDiagnosis]) -> DiagnosisResult<Vec<Diagnosis>> {
    let normalized = normalize(raw)?;
    if normalized.iter().any(|d| d.name.is_empty()) {
        return Err(DiagnosisError::BlankName);
    }
    Ok(dedupe(&normalized))
}

/// Clean an already-typed diagnosis list (re-trims and re-groups).
pub fn clean_diagnoses(diagnoses: &[Diagnosis]) -> Vec<Diagnosis> {
    // Every entry has a name, so normalization cannot fail here.
    let normalized: Vec<Diagnosis> = diagnoses
        .iter()
        .map(|d| {
            let mut cleaned = Diagnosis::new(d.name.trim());
            for symptom in &d.symptoms {
                cleaned.push_symptom(symptom);
            }
            cleaned
        })
        .collect();
    dedupe(&normalized)
}

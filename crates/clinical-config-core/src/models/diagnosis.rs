//! Diagnosis catalog models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A diagnosis as it arrives from the backend or from an editor, before cleaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawDiagnosis {
    /// Diagnosis name; `None` is a contract violation caught by the normalizer
    #[serde(default)]
    pub name: Option<String>,
    /// Symptom strings, possibly padded, blank or repeated
    #[serde(default)]
    pub symptoms: Vec<String>,
}

impl RawDiagnosis {
    /// Create a raw diagnosis with a name.
    pub fn new(name: impl Into<String>, symptoms: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            symptoms,
        }
    }
}

/// A cleaned diagnosis: trimmed name, trimmed and exact-deduplicated symptoms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnosis {
    pub name: String,
    pub symptoms: Vec<String>,
}

impl Diagnosis {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symptoms: Vec::new(),
        }
    }

    /// Grouping key used to merge diagnoses (case-insensitive, trimmed).
    pub fn key(&self) -> String {
        diagnosis_key(&self.name)
    }

    /// Whether this diagnosis is addressed by `name` under the grouping rule.
    pub fn matches(&self, name: &str) -> bool {
        self.key() == diagnosis_key(name)
    }

    /// Add a symptom unless an identical (case-sensitive) one is present.
    /// Returns true when the symptom was added.
    pub fn push_symptom(&mut self, symptom: &str) -> bool {
        let symptom = symptom.trim();
        if symptom.is_empty() || self.symptoms.iter().any(|s| s == symptom) {
            return false;
        }
        self.symptoms.push(symptom.to_string());
        true
    }
}

impl From<Diagnosis> for RawDiagnosis {
    fn from(diagnosis: Diagnosis) -> Self {
        Self {
            name: Some(diagnosis.name),
            symptoms: diagnosis.symptoms,
        }
    }
}

/// Grouping key for a diagnosis name.
pub fn diagnosis_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The diagnosis catalog of one specialty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialtyConfig {
    pub specialty_id: String,
    pub diagnoses: Vec<Diagnosis>,
}

impl SpecialtyConfig {
    pub fn new(specialty_id: impl Into<String>, diagnoses: Vec<Diagnosis>) -> Self {
        Self {
            specialty_id: specialty_id.into(),
            diagnoses,
        }
    }

    pub fn empty(specialty_id: impl Into<String>) -> Self {
        Self::new(specialty_id, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }

    /// Find a diagnosis by name (case-insensitive, trimmed).
    pub fn find(&self, name: &str) -> Option<&Diagnosis> {
        self.diagnoses.iter().find(|d| d.matches(name))
    }

    /// Content fingerprint of the diagnosis list, for optimistic concurrency.
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.diagnoses)
    }
}

/// SHA-256 hex digest of the canonical JSON of a diagnosis list.
pub fn fingerprint(diagnoses: &[Diagnosis]) -> String {
    // Vec<Diagnosis> of plain strings cannot fail to serialize
    let payload = serde_json::to_vec(diagnoses).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&payload);
    hex::encode(hasher.finalize())
}

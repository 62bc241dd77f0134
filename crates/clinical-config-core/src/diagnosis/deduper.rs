//! Diagnosis deduplication.
//!
//! Diagnoses are grouped by case-insensitive trimmed name. The first
//! occurrence fixes the group's position and spelling; symptoms are the
//! exact-string union of all occurrences in first-seen order.

use std::collections::HashMap;

use crate::models::Diagnosis;

/// Insertion-ordered map from grouping key to merged diagnosis.
#[derive(Debug, Default)]
struct OrderedGroups {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    merged: Vec<Diagnosis>,
}

impl OrderedGroups {
    fn insert(&mut self, diagnosis: &Diagnosis) {
        let key = diagnosis.key();
        match self.index.get(&key) {
            Some(&slot) => {
                let target = &mut self.merged[slot];
                for symptom in &diagnosis.symptoms {
                    target.push_symptom(symptom);
                }
            }
            None => {
                let mut first = Diagnosis::new(diagnosis.name.trim());
                for symptom in &diagnosis.symptoms {
                    first.push_symptom(symptom);
                }
                self.index.insert(key.clone(), self.merged.len());
                self.keys.push(key);
                self.merged.push(first);
            }
        }
    }

    fn into_vec(self) -> Vec<Diagnosis> {
        debug_assert_eq!(self.keys.len(), self.merged.len());
        self.merged
    }
}

/// Merge diagnoses sharing a grouping key.
pub fn dedupe(diagnoses: &[Diagnosis]) -> Vec<Diagnosis> {
    let mut groups = OrderedGroups::default();
    for diagnosis in diagnoses {
        groups.insert(diagnosis);
    }
    groups.into_vec()
}

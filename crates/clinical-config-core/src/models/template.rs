//! Prescription template models.

use serde::{Deserialize, Serialize};

/// A reusable bundle of default rows and instructions applied to a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    pub id: String,
    pub name: String,
    /// Comma-separated diagnosis names
    pub diagnosis_text: String,
    /// Comma-separated symptoms
    pub symptoms_text: String,
    pub medicines: Vec<TemplateMedicine>,
    pub vaccines: Vec<TemplateItem>,
    pub lab_tests: Vec<TemplateItem>,
    pub instructions: String,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a template from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A medicine entry of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateMedicine {
    /// Backend product id, when the template author picked one
    pub product_ref: Option<String>,
    pub sku: String,
    pub name: String,
    pub notes: String,
    /// Dose timing, e.g. "1-0-1"
    pub timing: String,
    pub when: String,
    pub frequency: String,
    pub duration: String,
}

/// A vaccine or lab test entry of a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateItem {
    pub name: String,
    pub sku: String,
    pub notes: String,
}

impl TemplateItem {
    pub fn new(sku: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sku: sku.into(),
            notes: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_shape() {
        let json = r#"{
            "id": "t1",
            "name": "Asthma follow-up",
            "diagnosisText": "Asthma, Bronchitis",
            "symptomsText": "Cough",
            "medicines": [{"productRef": "p-1", "sku": "M1", "name": "Salbutamol", "timing": "1-0-1"}],
            "labTests": [{"name": "Spirometry", "sku": "L1"}],
            "instructions": "Avoid dust"
        }"#;

        let template = Template::from_json(json).unwrap();
        assert_eq!(template.diagnosis_text, "Asthma, Bronchitis");
        assert_eq!(template.medicines[0].product_ref.as_deref(), Some("p-1"));
        assert_eq!(template.medicines[0].timing, "1-0-1");
        assert!(template.medicines[0].notes.is_empty());
        assert!(template.vaccines.is_empty());
        assert_eq!(template.lab_tests[0].sku, "L1");
    }
}

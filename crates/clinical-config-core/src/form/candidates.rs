//! Candidate rows extracted from a template.

use crate::models::{
    DiagnosisRow, ItemKind, ItemRef, LabTestRow, MedicineRow, SymptomRow, Template, TemplateItem,
    TemplateMedicine, VaccineRow,
};

use super::lookup::ReferenceLookup;

/// Rows a template offers for each collection, in template order.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    pub symptoms: Vec<SymptomRow>,
    pub diagnoses: Vec<DiagnosisRow>,
    pub medicines: Vec<MedicineRow>,
    pub vaccines: Vec<VaccineRow>,
    pub lab_tests: Vec<LabTestRow>,
}

/// Split comma-separated text into trimmed, non-empty tokens.
pub fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the candidate rows of every collection.
pub fn extract<L: ReferenceLookup>(template: &Template, lookup: &L, today: &str) -> Candidates {
    Candidates {
        symptoms: split_csv(&template.symptoms_text)
            .into_iter()
            .map(|symptom| SymptomRow::with_symptom(symptom, today))
            .collect(),
        diagnoses: split_csv(&template.diagnosis_text)
            .into_iter()
            .map(|diagnosis| DiagnosisRow::with_diagnosis(diagnosis, today))
            .collect(),
        medicines: template
            .medicines
            .iter()
            .filter(|m| !(m.sku.trim().is_empty() && m.name.trim().is_empty()))
            .map(|m| medicine_row(m, lookup))
            .collect(),
        vaccines: template
            .vaccines
            .iter()
            .filter(|item| !is_blank_item(item))
            .map(|item| {
                let (reference, sku) = resolve(lookup, ItemKind::Vaccine, None, item);
                VaccineRow {
                    vaccine_ref: Some(reference),
                    notes: item.notes.clone(),
                    sku,
                    ..VaccineRow::blank()
                }
            })
            .collect(),
        lab_tests: template
            .lab_tests
            .iter()
            .filter(|item| !is_blank_item(item))
            .map(|item| {
                let (reference, sku) = resolve(lookup, ItemKind::LabTest, None, item);
                LabTestRow {
                    lab_test_ref: Some(reference),
                    notes: item.notes.clone(),
                    sku,
                    ..LabTestRow::blank()
                }
            })
            .collect(),
    }
}

fn is_blank_item(item: &TemplateItem) -> bool {
    item.sku.trim().is_empty() && item.name.trim().is_empty()
}

fn medicine_row<L: ReferenceLookup>(medicine: &TemplateMedicine, lookup: &L) -> MedicineRow {
    let item = TemplateItem {
        name: medicine.name.clone(),
        sku: medicine.sku.clone(),
        notes: medicine.notes.clone(),
    };
    let (reference, sku) = resolve(lookup, ItemKind::Medicine, medicine.product_ref.clone(), &item);

    MedicineRow {
        medicine_ref: Some(reference),
        dose: medicine.timing.clone(),
        when: medicine.when.clone(),
        frequency: medicine.frequency.clone(),
        duration: medicine.duration.clone(),
        notes: medicine.notes.clone(),
        sku,
        ..MedicineRow::blank()
    }
}

/// Catalog reference when the SKU resolves, else one built from the raw
/// template fields. Also returns the SKU the row should carry.
fn resolve<L: ReferenceLookup>(
    lookup: &L,
    kind: ItemKind,
    id: Option<String>,
    item: &TemplateItem,
) -> (ItemRef, String) {
    let sku = item.sku.trim();
    match lookup.find(kind, sku) {
        Some(reference) => {
            let sku = reference.sku.clone();
            (reference, sku)
        }
        None => (
            ItemRef::synthetic(kind, id, sku, item.name.trim()),
            sku.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::ReferenceTable;
    use crate::models::CatalogItem;

    const TODAY: &str = "2024-03-01";

    #[test]
    fn test_split_csv() {
        assert_eq!(split_csv(" Cough, ,Fever ,,  "), vec!["Cough", "Fever"]);
        assert!(split_csv("").is_empty());
        assert!(split_csv(" , ").is_empty());
    }

    #[test]
    fn test_text_candidates_dated_today() {
        let mut template = Template::new("t1", "Cold");
        template.symptoms_text = "Cough, Sneeze".into();
        template.diagnosis_text = "Common cold".into();

        let candidates = extract(&template, &ReferenceTable::new(), TODAY);

        assert_eq!(candidates.symptoms.len(), 2);
        assert_eq!(candidates.symptoms[1].symptom, "Sneeze");
        assert_eq!(candidates.symptoms[1].date, TODAY);
        assert!(candidates.symptoms[1].severity.is_empty());
        assert_eq!(candidates.diagnoses[0].diagnosis, "Common cold");
    }

    #[test]
    fn test_medicine_resolved_from_catalog() {
        let mut item = CatalogItem::new(ItemKind::Medicine, "M1", "Paracetamol 500mg");
        item.server_id = Some("prod-1".into());
        let table: ReferenceTable = std::iter::once(item).collect();

        let mut template = Template::new("t1", "Fever");
        template.medicines.push(TemplateMedicine {
            sku: "M1".into(),
            name: "paracetamol".into(),
            timing: "1-0-1".into(),
            duration: "3 days".into(),
            ..Default::default()
        });

        let candidates = extract(&template, &table, TODAY);
        let row = &candidates.medicines[0];
        let reference = row.medicine_ref.as_ref().unwrap();

        assert!(!reference.synthetic);
        assert_eq!(reference.name, "Paracetamol 500mg");
        assert_eq!(reference.id.as_deref(), Some("prod-1"));
        assert_eq!(row.dose, "1-0-1");
        assert_eq!(row.duration, "3 days");
        assert_eq!(row.sku, "M1");
    }

    #[test]
    fn test_unresolved_items_get_synthetic_refs() {
        let mut template = Template::new("t1", "Checkup");
        template.medicines.push(TemplateMedicine {
            product_ref: Some("prod-9".into()),
            sku: " M9 ".into(),
            name: "Custom syrup".into(),
            ..Default::default()
        });
        template.vaccines.push(TemplateItem::new("V1", "Hep B"));
        template.lab_tests.push(TemplateItem::new("", "CBC"));
        template.lab_tests.push(TemplateItem::new(" ", " "));

        let candidates = extract(&template, &ReferenceTable::new(), TODAY);

        let medicine = candidates.medicines[0].medicine_ref.as_ref().unwrap();
        assert!(medicine.synthetic);
        assert_eq!(medicine.id.as_deref(), Some("prod-9"));
        assert_eq!(candidates.medicines[0].sku, "M9");

        assert_eq!(candidates.vaccines[0].vaccine_ref.as_ref().unwrap().name, "Hep B");
        assert_eq!(candidates.lab_tests.len(), 1);
        assert_eq!(candidates.lab_tests[0].lab_test_ref.as_ref().unwrap().name, "CBC");
    }
}

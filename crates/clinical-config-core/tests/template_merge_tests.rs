//! Template merge engine tests against a real catalog database.

use std::collections::HashSet;

use clinical_config_core::form::{reset_all_on, ReferenceTable, TemplateMergeEngine};
use clinical_config_core::models::{
    Attachment, CatalogItem, FormState, ItemKind, ItemRef, MedicineRow, Row, Template,
    TemplateItem, TemplateMedicine,
};
use clinical_config_core::Database;
use proptest::prelude::*;

const TODAY: &str = "2024-03-01";

fn medicine(sku: &str) -> TemplateMedicine {
    TemplateMedicine {
        sku: sku.into(),
        name: format!("Medicine {}", sku),
        ..Default::default()
    }
}

fn prescribed(sku: &str) -> MedicineRow {
    MedicineRow {
        medicine_ref: Some(ItemRef::synthetic(ItemKind::Medicine, None, sku, sku)),
        sku: sku.into(),
        ..MedicineRow::blank()
    }
}

fn catalog_db() -> Database {
    let mut db = Database::open_in_memory().unwrap();
    db.import_catalog_items(&[
        CatalogItem::new(ItemKind::Medicine, "M1", "Salbutamol inhaler"),
        CatalogItem::new(ItemKind::Medicine, "M2", "Montelukast 10mg"),
        CatalogItem::new(ItemKind::Vaccine, "V1", "Influenza vaccine"),
        CatalogItem::new(ItemKind::LabTest, "L1", "Spirometry"),
    ])
    .unwrap();
    db
}

fn skus(form: &FormState) -> Vec<String> {
    form.medicines
        .iter()
        .filter_map(|row| row.sku().map(str::to_string))
        .collect()
}

#[test]
fn test_fill_empty_row_then_append() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let form = FormState::new(TODAY);
    let blank_id = form.medicines[0].id.clone();
    let mut template = Template::new("t1", "Asthma");
    template.medicines = vec![medicine("M1"), medicine("M2")];

    let merged = engine.apply(&form, &template);

    assert_eq!(skus(&merged), vec!["M1", "M2"]);
    assert_eq!(merged.medicines[0].id, blank_id);
    let reference = merged.medicines[0].medicine_ref.as_ref().unwrap();
    assert_eq!(reference.name, "Salbutamol inhaler");
    assert!(!reference.synthetic);
}

#[test]
fn test_duplicate_sku_candidate_dropped() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let mut form = FormState::new(TODAY);
    form.medicines = vec![prescribed("M1"), MedicineRow::blank()];
    let mut template = Template::new("t1", "Asthma");
    template.medicines = vec![medicine("M1"), medicine("M3")];

    let (merged, report) = engine.apply_with_report(&form, &template);

    assert_eq!(skus(&merged), vec!["M1", "M3"]);
    assert_eq!(merged.medicines.len(), 2);
    assert_eq!(report.medicines.skipped_duplicates, 1);
    assert_eq!(report.medicines.filled, 1);

    // M3 is not in the catalog, so its reference comes from the template
    let reference = merged.medicines[1].medicine_ref.as_ref().unwrap();
    assert!(reference.synthetic);
    assert_eq!(reference.name, "Medicine M3");
}

#[test]
fn test_user_input_is_never_overwritten() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let mut form = FormState::new(TODAY);
    form.symptoms[0].symptom = "Headache".into();
    form.instructions = "Drink water".into();
    form.attachments.push(Attachment {
        file_name: "xray.png".into(),
        content_type: "image/png".into(),
        data: "aGVsbG8=".into(),
    });

    let mut template = Template::new("t1", "Asthma");
    template.symptoms_text = "Cough, , Wheeze ".into();
    template.instructions = "Use inhaler".into();

    let merged = engine.apply(&form, &template);

    let symptoms: Vec<_> = merged.symptoms.iter().map(|r| r.symptom.as_str()).collect();
    assert_eq!(symptoms, vec!["Headache", "Cough", "Wheeze"]);
    assert_eq!(merged.symptoms[1].date, TODAY);
    assert_eq!(merged.instructions, "Drink water");
    assert_eq!(merged.attachments, form.attachments);
    // Input untouched
    assert_eq!(form.symptoms.len(), 1);
}

#[test]
fn test_whitespace_instructions_are_filled() {
    let engine = TemplateMergeEngine::new(ReferenceTable::new()).with_today(TODAY);

    let mut form = FormState::new(TODAY);
    form.instructions = "   ".into();
    let mut template = Template::new("t1", "Asthma");
    template.instructions = "Use inhaler".into();

    let (merged, report) = engine.apply_with_report(&form, &template);
    assert_eq!(merged.instructions, "Use inhaler");
    assert!(report.instructions_filled);
}

#[test]
fn test_vaccine_and_lab_sections_become_visible() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let form = FormState::new(TODAY);
    let mut template = Template::new("t1", "Asthma");
    template.vaccines.push(TemplateItem::new("V1", "Flu shot"));

    let merged = engine.apply(&form, &template);
    assert!(merged.visibility.vaccines);
    assert!(!merged.visibility.lab_tests);
    assert_eq!(
        merged.vaccines[0].vaccine_ref.as_ref().unwrap().name,
        "Influenza vaccine"
    );

    // Visibility is never taken away
    let merged = engine.apply(&merged, &Template::new("t2", "Empty"));
    assert!(merged.visibility.vaccines);
}

#[test]
fn test_second_template_fills_remaining_slots() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let form = FormState::new(TODAY);
    let blank_diagnosis_id = form.diagnoses[0].id.clone();

    let mut first = Template::new("t1", "Flu");
    first.symptoms_text = "A".into();
    first.vaccines.push(TemplateItem::new("V1", "Flu shot"));
    let once = engine.apply(&form, &first);
    let filled_symptom_id = once.symptoms[0].id.clone();
    assert_eq!(filled_symptom_id, form.symptoms[0].id);

    let mut second = Template::new("t2", "Cold");
    second.symptoms_text = "B, C".into();
    second.diagnosis_text = "Common cold".into();
    let (twice, report) = engine.apply_with_report(&once, &second);

    let symptoms: Vec<_> = twice.symptoms.iter().map(|r| r.symptom.as_str()).collect();
    assert_eq!(symptoms, vec!["A", "B", "C"]);
    assert_eq!(twice.symptoms[0].id, filled_symptom_id);
    assert_eq!(report.symptoms.filled, 0);
    assert_eq!(report.symptoms.appended, 2);

    // The diagnosis slot left empty by the first template is filled now
    assert_eq!(twice.diagnoses.len(), 1);
    assert_eq!(twice.diagnoses[0].diagnosis, "Common cold");
    assert_eq!(twice.diagnoses[0].id, blank_diagnosis_id);

    assert_eq!(twice.vaccines.len(), 1);
    assert!(twice.visibility.vaccines);
}

#[test]
fn test_same_sku_allowed_in_vaccines() {
    let engine = TemplateMergeEngine::new(ReferenceTable::new()).with_today(TODAY);

    let form = FormState::new(TODAY);
    let mut template = Template::new("t1", "Boosters");
    template.vaccines = vec![TemplateItem::new("V1", "Dose 1"), TemplateItem::new("V1", "Dose 2")];

    let merged = engine.apply(&form, &template);
    assert_eq!(merged.vaccines.len(), 2);
}

#[test]
fn test_reset_after_merge() {
    let db = catalog_db();
    let engine = TemplateMergeEngine::new(&db).with_today(TODAY);

    let mut template = Template::new("t1", "Asthma");
    template.symptoms_text = "Cough".into();
    template.lab_tests.push(TemplateItem::new("L1", "Spirometry"));
    template.instructions = "Rest".into();
    let merged = engine.apply(&FormState::new(TODAY), &template);
    assert!(merged.visibility.lab_tests);

    let reset = reset_all_on(TODAY);
    assert_eq!(reset.symptoms.len(), 1);
    assert!(reset.symptoms[0].is_empty());
    assert_eq!(reset.diagnoses.len(), 1);
    assert_eq!(reset.medicines.len(), 1);
    assert!(reset.lab_tests.is_empty());
    assert!(!reset.visibility.lab_tests);
    assert_eq!(reset.instructions, "");
}

fn sku_list() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(vec!["M1", "M2", "M3", "M4"]), 0..6)
}

proptest! {
    #[test]
    fn prop_no_duplicate_medicine_skus(existing in sku_list(), incoming in sku_list(), blanks in 0usize..3) {
        let engine = TemplateMergeEngine::new(ReferenceTable::new()).with_today(TODAY);

        let mut unique_existing: Vec<&str> = Vec::new();
        for sku in existing {
            if !unique_existing.contains(&sku) {
                unique_existing.push(sku);
            }
        }

        let mut form = FormState::new(TODAY);
        form.medicines = unique_existing.iter().map(|sku| prescribed(sku)).collect();
        form.medicines.extend((0..blanks).map(|_| MedicineRow::blank()));

        let mut template = Template::new("t1", "Generated");
        template.medicines = incoming.iter().map(|sku| medicine(sku)).collect();

        let merged = engine.apply(&form, &template);

        let filled = skus(&merged);
        let distinct: HashSet<_> = filled.iter().collect();
        prop_assert_eq!(distinct.len(), filled.len());
        prop_assert!(merged.medicines.len() >= form.medicines.len());
        for (i, sku) in unique_existing.iter().enumerate() {
            prop_assert_eq!(merged.medicines[i].sku.as_str(), *sku);
        }
    }

    #[test]
    fn prop_non_blank_instructions_kept(current in "[a-z]{1,12}", incoming in "[a-z ]{0,12}") {
        let engine = TemplateMergeEngine::new(ReferenceTable::new()).with_today(TODAY);

        let mut form = FormState::new(TODAY);
        form.instructions = current.clone();
        let mut template = Template::new("t1", "Generated");
        template.instructions = incoming;

        prop_assert_eq!(engine.apply(&form, &template).instructions, current);
    }
}

//! Specialty config store tests over the in-memory backend.

use std::sync::Arc;

use clinical_config_core::models::{Diagnosis, RawDiagnosis};
use clinical_config_core::store::{
    BackendError, CacheState, MemoryBackend, PersistRequest, RecordedRequest,
    SpecialtyConfigStore, StoreError,
};
use clinical_config_core::DiagnosisError;

fn raw(name: &str, symptoms: &[&str]) -> RawDiagnosis {
    RawDiagnosis::new(name, symptoms.iter().map(|s| s.to_string()).collect())
}

fn setup() -> (Arc<MemoryBackend>, SpecialtyConfigStore<Arc<MemoryBackend>>) {
    let backend = Arc::new(MemoryBackend::new());
    let store = SpecialtyConfigStore::new(Arc::clone(&backend));
    (backend, store)
}

fn writes(backend: &MemoryBackend) -> Vec<RecordedRequest> {
    backend
        .requests()
        .into_iter()
        .filter(|r| !matches!(r, RecordedRequest::Fetch(_)))
        .collect()
}

#[tokio::test]
async fn test_first_save_creates_then_replaces() {
    let (backend, store) = setup();

    let first = store
        .save("cardio", &[raw("Angina ", &["Chest pain"])])
        .await
        .unwrap();
    assert_eq!(first.request, PersistRequest::Create);
    assert_eq!(first.config.diagnoses[0].name, "Angina");

    let second = store
        .save("cardio", &[raw("Angina", &["Chest pain", "Dyspnea"])])
        .await
        .unwrap();
    assert_eq!(second.request, PersistRequest::Replace);

    let requests = writes(&backend);
    assert_eq!(requests.len(), 2);
    assert!(matches!(&requests[0], RecordedRequest::Create(p) if p.specialty_id == "cardio"));
    assert!(matches!(&requests[1], RecordedRequest::Replace(id, _) if id == "cardio"));

    // Replace overwrote the server catalog instead of appending
    assert_eq!(backend.catalog("cardio").len(), 1);
    assert_eq!(
        store.cached("cardio").unwrap().diagnoses[0].symptoms,
        vec!["Chest pain", "Dyspnea"]
    );
}

#[tokio::test]
async fn test_save_sends_cleaned_payload() {
    let (backend, store) = setup();

    store
        .save("derm", &[raw("Eczema", &["Itch "]), raw("eczema", &["Itch", "Rash"])])
        .await
        .unwrap();

    match &writes(&backend)[0] {
        RecordedRequest::Create(payload) => {
            assert_eq!(
                payload.diagnosis,
                vec![Diagnosis {
                    name: "Eczema".into(),
                    symptoms: vec!["Itch".into(), "Rash".into()],
                }]
            );
        }
        other => panic!("expected create, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_all_empties_catalog() {
    let (backend, store) = setup();
    backend.seed("neuro", vec![raw("Migraine", &["Aura"]), raw("Epilepsy", &[])]);
    store.fetch("neuro").await.unwrap();

    store.delete_all("neuro").await.unwrap();

    assert_eq!(writes(&backend), vec![RecordedRequest::DeleteAll("neuro".into())]);
    assert!(backend.catalog("neuro").is_empty());
    assert_eq!(store.state("neuro"), CacheState::Loaded(Vec::new()));

    // An emptied catalog is created again on the next save
    let outcome = store.save("neuro", &[raw("Migraine", &[])]).await.unwrap();
    assert_eq!(outcome.request, PersistRequest::Create);
}

#[tokio::test]
async fn test_add_and_remove_symptom() {
    let (backend, store) = setup();
    backend.seed("pulm", vec![raw("Asthma", &["Cough"]), raw("COPD", &[])]);

    let outcome = store.add_symptom("pulm", " asthma", " Wheeze ").await.unwrap();
    assert_eq!(outcome.request, PersistRequest::Replace);
    assert_eq!(outcome.config.diagnoses[0].symptoms, vec!["Cough", "Wheeze"]);
    assert_eq!(outcome.config.diagnoses.len(), 2);

    let outcome = store.remove_symptom("pulm", "Asthma", 0).await.unwrap();
    assert_eq!(outcome.config.diagnoses[0].symptoms, vec!["Wheeze"]);
    assert_eq!(backend.catalog("pulm")[0].symptoms, vec!["Wheeze"]);
}

#[tokio::test]
async fn test_symptom_edit_errors() {
    let (backend, store) = setup();
    backend.seed("pulm", vec![raw("Asthma", &["Cough"])]);

    assert_eq!(
        store.add_symptom("pulm", "Asthma", "  ").await.unwrap_err(),
        StoreError::Validation(DiagnosisError::BlankSymptom)
    );
    assert!(matches!(
        store.add_symptom("pulm", "Gout", "Pain").await,
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        store.remove_symptom("pulm", "Asthma", 5).await,
        Err(StoreError::NotFound(_))
    ));
    assert!(writes(&backend).is_empty());
}

#[tokio::test]
async fn test_fetch_many_skips_failures() {
    let (backend, store) = setup();
    backend.seed("a", vec![raw("Gout", &[])]);
    backend.seed("b", vec![raw("Lupus", &[])]);
    backend.fail_next(BackendError::Network("timeout".into()));

    let configs = store.fetch_many(&["a", "b"]).await;

    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].specialty_id, "b");
    assert_eq!(store.state("a"), CacheState::Loaded(Vec::new()));
}

#[tokio::test]
async fn test_fetch_combined_dedupes_across_specialties() {
    let (backend, store) = setup();
    backend.seed("a", vec![raw("Fever", &["Chills"]), raw("Gout", &[])]);
    backend.seed("b", vec![raw("fever", &["Sweats"])]);

    let combined = store.fetch_combined(&["a", "b"]).await;

    assert_eq!(combined.len(), 2);
    assert_eq!(combined[0].name, "Fever");
    assert_eq!(combined[0].symptoms, vec!["Chills", "Sweats"]);
}

#[tokio::test]
async fn test_invalidate_discards_in_flight_fetch() {
    let (backend, store) = setup();
    backend.seed("sp", vec![raw("Gout", &[])]);

    let gate = backend.hold_next_fetch();
    let fetch = store.fetch("sp");
    let invalidate = async {
        tokio::task::yield_now().await;
        store.invalidate("sp");
        drop(gate);
    };

    let (result, ()) = tokio::join!(fetch, invalidate);

    assert!(matches!(result, Err(StoreError::Superseded { .. })));
    assert_eq!(store.state("sp"), CacheState::Unloaded);
}

#[tokio::test]
async fn test_concurrent_symptom_edits_are_not_lost() {
    let (backend, store) = setup();
    backend.seed("sp", vec![raw("Asthma", &[])]);
    store.fetch("sp").await.unwrap();

    let (a, b) = tokio::join!(
        store.add_symptom("sp", "Asthma", "Cough"),
        store.add_symptom("sp", "Asthma", "Wheeze"),
    );
    a.unwrap();
    b.unwrap();

    let config = store.cached("sp").unwrap();
    let symptoms = &config.diagnoses[0].symptoms;
    assert_eq!(symptoms.len(), 2);
    assert!(symptoms.contains(&"Cough".to_string()));
    assert!(symptoms.contains(&"Wheeze".to_string()));
}

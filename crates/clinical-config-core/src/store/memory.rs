//! In-process backend with server semantics, for tests and offline use.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::models::{Diagnosis, RawDiagnosis};

use super::backend::{BackendError, BackendResult, ConfigBackend, ConfigDocument, ConfigPayload};

/// A request as the backend received it.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Fetch(String),
    Create(ConfigPayload),
    Replace(String, ConfigPayload),
    DeleteAll(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    catalogs: HashMap<String, Vec<RawDiagnosis>>,
    requests: Vec<RecordedRequest>,
    failures: VecDeque<BackendError>,
    fetch_gates: VecDeque<oneshot::Receiver<()>>,
}

/// Stores catalogs in a map. POST appends, PUT replaces, DELETE removes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a catalog directly, bypassing the request log.
    pub fn seed(&self, specialty_id: &str, diagnoses: Vec<RawDiagnosis>) {
        self.state()
            .catalogs
            .insert(specialty_id.to_string(), diagnoses);
    }

    /// Current server-side catalog.
    pub fn catalog(&self, specialty_id: &str) -> Vec<RawDiagnosis> {
        self.state()
            .catalogs
            .get(specialty_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    /// Make the next request fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.state().failures.push_back(error);
    }

    /// Hold the response of the next fetch until the returned sender fires or
    /// is dropped. The fetch snapshots the catalog when it arrives.
    pub fn hold_next_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state().fetch_gates.push_back(rx);
        tx
    }

    fn begin(&self, request: RecordedRequest) -> BackendResult<()> {
        let mut state = self.state();
        state.requests.push(request);
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn to_raw(diagnoses: &[Diagnosis]) -> Vec<RawDiagnosis> {
    diagnoses.iter().cloned().map(Into::into).collect()
}

#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn fetch(&self, specialty_id: &str) -> BackendResult<ConfigDocument> {
        self.begin(RecordedRequest::Fetch(specialty_id.to_string()))?;
        let (snapshot, gate) = {
            let mut state = self.state();
            let snapshot = state.catalogs.get(specialty_id).cloned().unwrap_or_default();
            (snapshot, state.fetch_gates.pop_front())
        };
        if let Some(gate) = gate {
            // A dropped sender releases the fetch as well.
            let _ = gate.await;
        }
        Ok(ConfigDocument { diagnosis: snapshot })
    }

    async fn create(&self, payload: &ConfigPayload) -> BackendResult<()> {
        self.begin(RecordedRequest::Create(payload.clone()))?;
        self.state()
            .catalogs
            .entry(payload.specialty_id.clone())
            .or_default()
            .extend(to_raw(&payload.diagnosis));
        Ok(())
    }

    async fn replace(&self, specialty_id: &str, payload: &ConfigPayload) -> BackendResult<()> {
        self.begin(RecordedRequest::Replace(
            specialty_id.to_string(),
            payload.clone(),
        ))?;
        self.state()
            .catalogs
            .insert(specialty_id.to_string(), to_raw(&payload.diagnosis));
        Ok(())
    }

    async fn delete_all(&self, specialty_id: &str) -> BackendResult<()> {
        self.begin(RecordedRequest::DeleteAll(specialty_id.to_string()))?;
        self.state().catalogs.remove(specialty_id);
        Ok(())
    }
}

//! Specialty configuration store.
//!
//! Owns the per-specialty diagnosis cache and decides, for every save,
//! whether the backend should create the catalog or replace it wholesale.
//!
//! Invalidation points:
//! - `fetch` replaces the entry with server data (empty on failure)
//! - every successful mutation re-fetches; the server response is ground truth
//! - `delete_all` and `invalidate` discard in-flight fetches
//!
//! Mutations of one specialty are serialized, so the read-modify-write of
//! `add_symptom` / `remove_symptom` always starts from the latest
//! server-confirmed state this process has seen.

mod backend;
mod cache;
mod memory;

pub use backend::*;
pub use cache::CacheState;
pub use memory::*;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::diagnosis::{self, DiagnosisError};
use crate::models::{fingerprint, Diagnosis, RawDiagnosis, SpecialtyConfig};

use cache::{ConfigCache, WriteLocks};

/// Store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] DiagnosisError),

    #[error("Transport failed: {0}")]
    Transport(#[from] BackendError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A newer fetch for specialty {specialty_id} superseded this one")]
    Superseded { specialty_id: String },

    #[error("Catalog changed since it was read (expected {expected}, found {actual})")]
    Conflict { expected: String, actual: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which request a save issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistRequest {
    Create,
    Replace,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub request: PersistRequest,
    /// Catalog as re-fetched after the write
    pub config: SpecialtyConfig,
}

/// Cache of specialty diagnosis catalogs in front of a [`ConfigBackend`].
pub struct SpecialtyConfigStore<B> {
    backend: B,
    cache: ConfigCache,
    write_locks: WriteLocks,
}

impl<B: ConfigBackend> SpecialtyConfigStore<B> {
    /// Create a store with an empty cache.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            cache: ConfigCache::default(),
            write_locks: WriteLocks::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Local state of a specialty's entry.
    pub fn state(&self, specialty_id: &str) -> CacheState {
        self.cache.state(specialty_id)
    }

    /// Cached catalog, if the specialty has been loaded.
    pub fn cached(&self, specialty_id: &str) -> Option<SpecialtyConfig> {
        match self.cache.state(specialty_id) {
            CacheState::Unloaded => None,
            CacheState::Loaded(diagnoses) => Some(SpecialtyConfig::new(specialty_id, diagnoses)),
        }
    }

    /// Forget the cached catalog and ignore any fetch still in flight.
    pub fn invalidate(&self, specialty_id: &str) {
        debug!(specialty_id = %specialty_id, "invalidating cached catalog");
        self.cache.overwrite(specialty_id, CacheState::Unloaded);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch a catalog from the backend and replace the cache entry with it.
    ///
    /// On failure the entry becomes an empty list, so stale data is never
    /// presented as fresh. A response overtaken by a newer fetch is dropped
    /// and reported as [`StoreError::Superseded`].
    pub async fn fetch(&self, specialty_id: &str) -> StoreResult<SpecialtyConfig> {
        let token = self.cache.issue_token(specialty_id);

        let result = match self.backend.fetch(specialty_id).await {
            Ok(document) => diagnosis::clean(&document.diagnosis).map_err(StoreError::from),
            Err(err) => Err(StoreError::from(err)),
        };

        match result {
            Ok(diagnoses) => {
                if !self.cache.commit(specialty_id, token, diagnoses.clone()) {
                    debug!(specialty_id = %specialty_id, token, "discarding stale fetch response");
                    return Err(StoreError::Superseded {
                        specialty_id: specialty_id.to_string(),
                    });
                }
                Ok(SpecialtyConfig::new(specialty_id, diagnoses))
            }
            Err(err) => {
                if self.cache.commit(specialty_id, token, Vec::new()) {
                    warn!(specialty_id = %specialty_id, error = %err, "fetch failed, cache cleared");
                }
                Err(err)
            }
        }
    }

    /// Fetch several catalogs at once. Failed fetches are logged and left out.
    pub async fn fetch_many<S: AsRef<str>>(&self, specialty_ids: &[S]) -> Vec<SpecialtyConfig> {
        let fetches = specialty_ids.iter().map(|id| async move {
            let id = id.as_ref();
            match self.fetch(id).await {
                Ok(config) => Some(config),
                Err(err) => {
                    warn!(specialty_id = %id, error = %err, "skipping specialty in batch fetch");
                    None
                }
            }
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    /// Diagnoses of several specialties combined into one deduplicated list.
    pub async fn fetch_combined<S: AsRef<str>>(&self, specialty_ids: &[S]) -> Vec<Diagnosis> {
        let combined: Vec<Diagnosis> = self
            .fetch_many(specialty_ids)
            .await
            .into_iter()
            .flat_map(|config| config.diagnoses)
            .collect();
        diagnosis::dedupe(&combined)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Persist a full catalog: create when the local entry is unloaded or
    /// empty, replace otherwise.
    pub async fn save(
        &self,
        specialty_id: &str,
        diagnoses: &[RawDiagnosis],
    ) -> StoreResult<SaveOutcome> {
        let cleaned = diagnosis::clean_for_save(diagnoses)?;
        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;
        self.save_locked(specialty_id, cleaned, None).await
    }

    /// Like [`save`](Self::save), but only when the cached catalog still has
    /// the fingerprint the caller's edit was based on.
    pub async fn save_if_unchanged(
        &self,
        specialty_id: &str,
        diagnoses: &[RawDiagnosis],
        expected_fingerprint: &str,
    ) -> StoreResult<SaveOutcome> {
        let cleaned = diagnosis::clean_for_save(diagnoses)?;
        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;
        self.save_locked(specialty_id, cleaned, Some(expected_fingerprint))
            .await
    }

    /// Delete the whole catalog of a specialty.
    ///
    /// This is the only delete the backend offers; there is no variant that
    /// removes a single diagnosis.
    pub async fn delete_all(&self, specialty_id: &str) -> StoreResult<()> {
        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;

        self.backend.delete_all(specialty_id).await?;
        self.cache
            .overwrite(specialty_id, CacheState::Loaded(Vec::new()));
        info!(specialty_id = %specialty_id, "deleted specialty catalog");
        Ok(())
    }

    /// Append one diagnosis with no symptoms, then re-fetch.
    pub async fn add_one(&self, specialty_id: &str, name: &str) -> StoreResult<SpecialtyConfig> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DiagnosisError::BlankName.into());
        }

        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;

        let payload = ConfigPayload::new(specialty_id, vec![Diagnosis::new(name)]);
        self.backend.create(&payload).await?;
        info!(specialty_id = %specialty_id, diagnosis = %name, "appended diagnosis");
        self.resync(specialty_id).await
    }

    /// Add a symptom to one diagnosis by rewriting the whole catalog.
    pub async fn add_symptom(
        &self,
        specialty_id: &str,
        diagnosis_name: &str,
        symptom: &str,
    ) -> StoreResult<SaveOutcome> {
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return Err(DiagnosisError::BlankSymptom.into());
        }

        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;

        let mut diagnoses = self.loaded_diagnoses(specialty_id).await?;
        let target = find_diagnosis(&mut diagnoses, diagnosis_name)?;
        target.push_symptom(symptom);

        self.save_locked(specialty_id, diagnoses, None).await
    }

    /// Remove the symptom at `symptom_index` from one diagnosis by rewriting
    /// the whole catalog.
    pub async fn remove_symptom(
        &self,
        specialty_id: &str,
        diagnosis_name: &str,
        symptom_index: usize,
    ) -> StoreResult<SaveOutcome> {
        let lock = self.write_locks.for_specialty(specialty_id);
        let _guard = lock.lock().await;

        let mut diagnoses = self.loaded_diagnoses(specialty_id).await?;
        let target = find_diagnosis(&mut diagnoses, diagnosis_name)?;
        if symptom_index >= target.symptoms.len() {
            return Err(StoreError::NotFound(format!(
                "symptom #{} of diagnosis '{}'",
                symptom_index, target.name
            )));
        }
        target.symptoms.remove(symptom_index);

        self.save_locked(specialty_id, diagnoses, None).await
    }

    // =========================================================================
    // Internals (caller holds the specialty's write lock)
    // =========================================================================

    async fn save_locked(
        &self,
        specialty_id: &str,
        diagnoses: Vec<Diagnosis>,
        expected_fingerprint: Option<&str>,
    ) -> StoreResult<SaveOutcome> {
        let state = self.cache.state(specialty_id);

        if let Some(expected) = expected_fingerprint {
            let actual = fingerprint(state.diagnoses().unwrap_or_default());
            if actual != expected {
                return Err(StoreError::Conflict {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        let request = if state.is_empty() {
            PersistRequest::Create
        } else {
            PersistRequest::Replace
        };
        debug!(specialty_id = %specialty_id, ?request, count = diagnoses.len(), "persisting catalog");

        let payload = ConfigPayload::new(specialty_id, diagnoses);
        match request {
            PersistRequest::Create => self.backend.create(&payload).await?,
            PersistRequest::Replace => self.backend.replace(specialty_id, &payload).await?,
        }
        info!(specialty_id = %specialty_id, ?request, "saved specialty catalog");

        let config = self.resync(specialty_id).await?;
        Ok(SaveOutcome { request, config })
    }

    /// Re-fetch after a successful write. If another fetch overtook this one,
    /// report what the cache holds instead of failing the write.
    async fn resync(&self, specialty_id: &str) -> StoreResult<SpecialtyConfig> {
        match self.fetch(specialty_id).await {
            Err(StoreError::Superseded { .. }) => Ok(self
                .cached(specialty_id)
                .unwrap_or_else(|| SpecialtyConfig::empty(specialty_id))),
            other => other,
        }
    }

    async fn loaded_diagnoses(&self, specialty_id: &str) -> StoreResult<Vec<Diagnosis>> {
        match self.cache.state(specialty_id) {
            CacheState::Loaded(diagnoses) => Ok(diagnoses),
            CacheState::Unloaded => Ok(self.fetch(specialty_id).await?.diagnoses),
        }
    }
}

fn find_diagnosis<'a>(
    diagnoses: &'a mut [Diagnosis],
    name: &str,
) -> StoreResult<&'a mut Diagnosis> {
    diagnoses
        .iter_mut()
        .find(|d| d.matches(name))
        .ok_or_else(|| StoreError::NotFound(format!("diagnosis '{}'", name.trim())))
}

//! Per-specialty diagnosis cache with fetch request tokens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::Diagnosis;

/// Local view of one specialty's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CacheState {
    /// Never fetched, or explicitly invalidated
    #[default]
    Unloaded,
    /// Last known server state (possibly empty)
    Loaded(Vec<Diagnosis>),
}

impl CacheState {
    /// True for `Unloaded` and `Loaded(empty)`: a save from here creates.
    pub fn is_empty(&self) -> bool {
        match self {
            CacheState::Unloaded => true,
            CacheState::Loaded(diagnoses) => diagnoses.is_empty(),
        }
    }

    pub fn diagnoses(&self) -> Option<&[Diagnosis]> {
        match self {
            CacheState::Unloaded => None,
            CacheState::Loaded(diagnoses) => Some(diagnoses),
        }
    }
}

#[derive(Debug, Default)]
struct CacheEntry {
    state: CacheState,
    /// Token of the most recently issued fetch
    latest_token: u64,
}

/// Keyed cache. The lock is never held across an await point.
#[derive(Debug, Default)]
pub(crate) struct ConfigCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ConfigCache {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self, specialty_id: &str) -> CacheState {
        self.entries()
            .get(specialty_id)
            .map(|entry| entry.state.clone())
            .unwrap_or_default()
    }

    /// Issue a new fetch token; any earlier token becomes stale.
    pub fn issue_token(&self, specialty_id: &str) -> u64 {
        let mut entries = self.entries();
        let entry = entries.entry(specialty_id.to_string()).or_default();
        entry.latest_token += 1;
        entry.latest_token
    }

    /// Store a fetch result if `token` is still the latest. Returns false when
    /// the result was discarded.
    pub fn commit(&self, specialty_id: &str, token: u64, diagnoses: Vec<Diagnosis>) -> bool {
        let mut entries = self.entries();
        let entry = entries.entry(specialty_id.to_string()).or_default();
        if entry.latest_token != token {
            return false;
        }
        entry.state = CacheState::Loaded(diagnoses);
        true
    }

    /// Set the entry outright and make every in-flight fetch stale.
    pub fn overwrite(&self, specialty_id: &str, state: CacheState) {
        let mut entries = self.entries();
        let entry = entries.entry(specialty_id.to_string()).or_default();
        entry.latest_token += 1;
        entry.state = state;
    }
}

/// One async mutex per specialty, serializing mutating operations.
#[derive(Debug, Default)]
pub(crate) struct WriteLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WriteLocks {
    pub fn for_specialty(&self, specialty_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(specialty_id.to_string()).or_default().clone()
    }
}

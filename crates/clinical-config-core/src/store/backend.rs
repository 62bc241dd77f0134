//! Backend contract for specialty configuration persistence.
//!
//! Wire shapes:
//! - `GET    /speciality/configure/{id}` → [`ConfigDocument`]
//! - `POST   /speciality/configure`      ← [`ConfigPayload`] (create / append)
//! - `PUT    /speciality/configure/{id}` ← [`ConfigPayload`] (full replace)
//! - `DELETE /speciality/configure/{id}`

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Diagnosis, RawDiagnosis};

/// Transport-level failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not decode backend response: {0}")]
    Decode(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Body of a configuration GET.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigDocument {
    #[serde(default)]
    pub diagnosis: Vec<RawDiagnosis>,
}

/// Body of a create or replace request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigPayload {
    #[serde(rename = "specialityId")]
    pub specialty_id: String,
    pub diagnosis: Vec<Diagnosis>,
}

impl ConfigPayload {
    pub fn new(specialty_id: impl Into<String>, diagnosis: Vec<Diagnosis>) -> Self {
        Self {
            specialty_id: specialty_id.into(),
            diagnosis,
        }
    }
}

/// The four calls the store issues. Retries, auth and base paths belong to
/// the implementation.
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    /// Read the catalog of one specialty.
    async fn fetch(&self, specialty_id: &str) -> BackendResult<ConfigDocument>;

    /// Create the catalog, or append to it when it already exists.
    async fn create(&self, payload: &ConfigPayload) -> BackendResult<()>;

    /// Overwrite the whole catalog.
    async fn replace(&self, specialty_id: &str, payload: &ConfigPayload) -> BackendResult<()>;

    /// Delete every diagnosis of the specialty.
    async fn delete_all(&self, specialty_id: &str) -> BackendResult<()>;
}

#[async_trait]
impl<T: ConfigBackend + ?Sized> ConfigBackend for Arc<T> {
    async fn fetch(&self, specialty_id: &str) -> BackendResult<ConfigDocument> {
        (**self).fetch(specialty_id).await
    }

    async fn create(&self, payload: &ConfigPayload) -> BackendResult<()> {
        (**self).create(payload).await
    }

    async fn replace(&self, specialty_id: &str, payload: &ConfigPayload) -> BackendResult<()> {
        (**self).replace(specialty_id, payload).await
    }

    async fn delete_all(&self, specialty_id: &str) -> BackendResult<()> {
        (**self).delete_all(specialty_id).await
    }
}

//! Clinical Config HTTP Backend
//!
//! `reqwest` implementation of the specialty configuration REST calls:
//!
//! ```text
//! SpecialtyConfigStore ──► HttpBackend ──► GET    {base}/speciality/configure/{id}
//!                                          POST   {base}/speciality/configure
//!                                          PUT    {base}/speciality/configure/{id}
//!                                          DELETE {base}/speciality/configure/{id}
//! ```
//!
//! Settings come from [`HttpBackendConfig`], usually loaded with
//! [`HttpBackendConfig::from_env`].

pub mod client;
pub mod config;

pub use client::HttpBackend;
pub use config::{HttpBackendConfig, HttpConfigError};

use anyhow::Context;
use clinical_config_core::SpecialtyConfigStore;

/// Build a store backed by the service configured in the environment.
pub fn store_from_env() -> anyhow::Result<SpecialtyConfigStore<HttpBackend>> {
    let config = HttpBackendConfig::from_env()?;
    let backend = HttpBackend::new(config).context("failed to create HTTP backend")?;
    Ok(SpecialtyConfigStore::new(backend))
}

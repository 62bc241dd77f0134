//! Backend connection settings.

use anyhow::Context;
use reqwest::Url;
use thiserror::Error;

pub const BASE_URL_VAR: &str = "CLINICAL_CONFIG_BASE_URL";
pub const AUTH_TOKEN_VAR: &str = "CLINICAL_CONFIG_AUTH_TOKEN";
pub const TIMEOUT_SECS_VAR: &str = "CLINICAL_CONFIG_TIMEOUT_SECS";

/// Invalid backend configuration.
#[derive(Error, Debug)]
pub enum HttpConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Timeout must be at least one second")]
    ZeroTimeout,

    #[error("Could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Where and how to reach the configuration service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    /// API root, e.g. `https://host/api/v1`
    pub base_url: String,
    /// Sent as a bearer token when present
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            auth_token: None,
            timeout_secs: 30,
        }
    }
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Load `.env` if present, then read settings from the environment.
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_VAR).filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        config.auth_token = lookup(AUTH_TOKEN_VAR).filter(|v| !v.trim().is_empty());
        if let Some(raw) = lookup(TIMEOUT_SECS_VAR) {
            config.timeout_secs = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of seconds, got '{}'", TIMEOUT_SECS_VAR, raw))?;
        }

        config
            .validate()
            .with_context(|| format!("invalid backend configuration from {}", BASE_URL_VAR))?;
        Ok(config)
    }

    /// Check the settings and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, HttpConfigError> {
        if self.timeout_secs == 0 {
            return Err(HttpConfigError::ZeroTimeout);
        }
        let invalid = |reason: String| HttpConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) URL".into()));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = HttpBackendConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HttpBackendConfig::default());
    }

    #[test]
    fn test_reads_all_variables() {
        let config = HttpBackendConfig::from_lookup(lookup(&[
            (BASE_URL_VAR, " https://clinic.example/api "),
            (AUTH_TOKEN_VAR, "secret"),
            (TIMEOUT_SECS_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://clinic.example/api");
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(HttpBackendConfig::from_lookup(lookup(&[(TIMEOUT_SECS_VAR, "soon")])).is_err());
        assert!(HttpBackendConfig::from_lookup(lookup(&[(TIMEOUT_SECS_VAR, "0")])).is_err());
        assert!(HttpBackendConfig::from_lookup(lookup(&[(BASE_URL_VAR, "not a url")])).is_err());
        assert!(matches!(
            HttpBackendConfig::new("mailto:ops@example.com").validate(),
            Err(HttpConfigError::InvalidBaseUrl { .. })
        ));
    }
}

//! REST implementation of [`ConfigBackend`].

use std::time::Duration;

use async_trait::async_trait;
use clinical_config_core::store::{BackendError, BackendResult, ConfigBackend, ConfigDocument, ConfigPayload};
use reqwest::{RequestBuilder, Response, Url};
use tracing::debug;

use crate::config::{HttpBackendConfig, HttpConfigError};

const CONFIGURE_PATH: [&str; 2] = ["speciality", "configure"];

/// Talks to `{base}/speciality/configure` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpBackend {
    /// Create a backend from validated settings.
    pub fn new(config: HttpBackendConfig) -> Result<Self, HttpConfigError> {
        let base_url = config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            auth_token: config.auth_token,
        })
    }

    /// Collection endpoint, or the endpoint of one specialty.
    fn endpoint(&self, specialty_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        // validate() rejected cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(CONFIGURE_PATH);
            if let Some(id) = specialty_id {
                segments.push(id);
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> BackendResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        debug!(action, status = status.as_u16(), "configuration request finished");
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: if message.is_empty() {
                    format!("{} failed", action)
                } else {
                    message
                },
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ConfigBackend for HttpBackend {
    async fn fetch(&self, specialty_id: &str) -> BackendResult<ConfigDocument> {
        let request = self.client.get(self.endpoint(Some(specialty_id)));
        let response = self.send(request, "fetch").await?;

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn create(&self, payload: &ConfigPayload) -> BackendResult<()> {
        let request = self.client.post(self.endpoint(None)).json(payload);
        self.send(request, "create").await?;
        Ok(())
    }

    async fn replace(&self, specialty_id: &str, payload: &ConfigPayload) -> BackendResult<()> {
        let request = self.client.put(self.endpoint(Some(specialty_id))).json(payload);
        self.send(request, "replace").await?;
        Ok(())
    }

    async fn delete_all(&self, specialty_id: &str) -> BackendResult<()> {
        let request = self.client.delete(self.endpoint(Some(specialty_id)));
        self.send(request, "delete").await?;
        Ok(())
    }
}

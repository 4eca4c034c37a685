//! HTTP client for hosted inference endpoints.
//!
//! One `HttpScorer` per model. Calls are a single POST with no retry; a
//! non-2xx status or an unparsable body fails the call.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::wire::{InferenceRequest, ResponseShape};
use super::{LabelScorer, ScoreResult};
use crate::error::{ConfigError, ProviderError};

/// Maximum number of response-body characters echoed into error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Configuration for one hosted model.
#[derive(Debug, Clone)]
pub struct HttpScorerConfig {
    /// Provider name used in logs and errors (e.g. "zero-shot").
    pub name: String,
    /// Full endpoint URL.
    pub endpoint: String,
    /// Bearer token. `None` sends no `Authorization` header.
    pub api_key: Option<SecretString>,
    /// Response shape this endpoint answers with.
    pub shape: ResponseShape,
    /// Zero-shot `multi_label` flag (scores independent instead of softmax).
    pub multi_label: bool,
}

/// A `LabelScorer` backed by an HTTP inference endpoint.
pub struct HttpScorer {
    config: HttpScorerConfig,
    client: reqwest::Client,
}

impl HttpScorer {
    /// Create a scorer with its own client and the given request timeout.
    pub fn new(config: HttpScorerConfig, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a scorer sharing an existing client.
    pub fn with_client(config: HttpScorerConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn request_failed(&self, reason: String) -> ProviderError {
        ProviderError::RequestFailed {
            provider: self.config.name.clone(),
            reason,
        }
    }
}

#[async_trait]
impl LabelScorer for HttpScorer {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn score(&self, text: &str, labels: &[String]) -> Result<Vec<ScoreResult>, ProviderError> {
        let body = InferenceRequest::for_shape(self.config.shape, text, labels, self.config.multi_label);

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.request_failed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            warn!(provider = %self.config.name, status = status.as_u16(), "Provider rejected credentials");
            return Err(ProviderError::AuthFailed {
                provider: self.config.name.clone(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                provider = %self.config.name,
                status = status.as_u16(),
                "Provider returned non-success status"
            );
            return Err(ProviderError::Status {
                provider: self.config.name.clone(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_failed(format!("reading body: {e}")))?;

        let results = self.config.shape.parse(&self.config.name, &bytes)?;
        debug!(
            provider = %self.config.name,
            labels = results.len(),
            "Provider scored text"
        );
        Ok(results)
    }
}

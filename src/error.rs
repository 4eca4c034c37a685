//! Error types for the email classifier.

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Label-scoring provider errors.
///
/// Every variant names the provider so a failed batch can be traced back to
/// the model that broke it.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

impl ProviderError {
    /// Name of the provider that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::RequestFailed { provider, .. }
            | Self::Status { provider, .. }
            | Self::AuthFailed { provider }
            | Self::InvalidResponse { provider, .. } => provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_names_provider() {
        let err = ProviderError::Status {
            provider: "zero-shot".into(),
            status: 503,
            body: "model loading".into(),
        };
        assert_eq!(err.provider(), "zero-shot");
        assert_eq!(
            err.to_string(),
            "Provider zero-shot returned HTTP 503: model loading"
        );
    }

    #[test]
    fn config_error_names_key() {
        let err = ConfigError::InvalidValue {
            key: "CLASSIFIER_TIMEOUT_SECS".into(),
            message: "must be greater than zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for CLASSIFIER_TIMEOUT_SECS: must be greater than zero"
        );
    }
}

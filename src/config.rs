//! Configuration types.
//!
//! Everything is read once at startup and handed to constructors; the
//! decision engine never touches the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::pipeline::processor::DEFAULT_MAX_CONCURRENCY;
use crate::scoring::{ScoringConfig, ScoringMode};

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to.
    pub bind: SocketAddr,
    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,
    /// Scorer setup.
    pub scoring: ScoringConfig,
    /// Emails decided concurrently per batch.
    pub max_concurrency: usize,
    /// Fixed seed for reply selection.
    pub reply_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            cors_origins: Vec::new(),
            scoring: ScoringConfig::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            reply_seed: None,
        }
    }
}

impl AppConfig {
    /// Build config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let scoring_defaults = defaults.scoring.clone();

        let bind = parse_or(&lookup, "CLASSIFIER_BIND", defaults.bind)?;

        let cors_origins = lookup("CLASSIFIER_CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mode = match lookup("CLASSIFIER_MODE").as_deref().map(str::trim) {
            None | Some("") | Some("remote") => ScoringMode::Remote,
            Some("local") => ScoringMode::Local,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "CLASSIFIER_MODE".into(),
                    message: format!("expected 'remote' or 'local', got '{other}'"),
                });
            }
        };

        let api_key = lookup("HF_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let api_base = lookup("CLASSIFIER_API_BASE").unwrap_or(scoring_defaults.api_base);
        let zero_shot_model =
            lookup("CLASSIFIER_ZERO_SHOT_MODEL").unwrap_or(scoring_defaults.zero_shot_model);
        let phishing_model =
            optional_model(&lookup, "CLASSIFIER_PHISHING_MODEL", scoring_defaults.phishing_model);
        let toxicity_model =
            optional_model(&lookup, "CLASSIFIER_TOXICITY_MODEL", scoring_defaults.toxicity_model);

        let timeout_secs: u64 = parse_or(
            &lookup,
            "CLASSIFIER_TIMEOUT_SECS",
            scoring_defaults.timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CLASSIFIER_TIMEOUT_SECS".into(),
                message: "must be greater than zero".into(),
            });
        }

        let max_concurrency: usize =
            parse_or(&lookup, "CLASSIFIER_MAX_CONCURRENCY", defaults.max_concurrency)?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CLASSIFIER_MAX_CONCURRENCY".into(),
                message: "must be greater than zero".into(),
            });
        }

        let reply_seed = match lookup("CLASSIFIER_REPLY_SEED") {
            Some(raw) => Some(parse_value("CLASSIFIER_REPLY_SEED", &raw)?),
            None => None,
        };

        Ok(Self {
            bind,
            cors_origins,
            scoring: ScoringConfig {
                mode,
                api_key,
                api_base,
                zero_shot_model,
                phishing_model,
                toxicity_model,
                timeout: Duration::from_secs(timeout_secs),
                ..scoring_defaults
            },
            max_concurrency,
            reply_seed,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

/// Unset → default model; set but empty → disabled.
fn optional_model<F>(lookup: &F, key: &str, default: Option<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if raw.trim().is_empty() => None,
        Some(raw) => Some(raw.trim().to_string()),
        None => default,
    }
}

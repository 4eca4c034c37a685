//! Label-scoring providers.
//!
//! Supports:
//! - **Hosted models** over HTTP (zero-shot NLI, phishing and toxicity
//!   classification heads), see [`HttpScorer`]
//! - **Local heuristics** that need no network, see [`HeuristicScorer`]
//!
//! Every provider normalizes its output into a list of [`ScoreResult`]s.

pub mod heuristic;
pub mod http;
pub mod wire;

pub use heuristic::HeuristicScorer;
pub use http::{HttpScorer, HttpScorerConfig};
pub use wire::ResponseShape;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ProviderError};
use crate::pipeline::decision::{DecisionEngine, PhishingCheck, ToxicityCheck};
use crate::pipeline::types::CandidateLabelSet;

/// Where the primary scores come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringMode {
    /// Hosted models over HTTP, with the phishing/toxicity cascade.
    Remote,
    /// Local hint-word heuristics; no network, no cascade.
    Local,
}

/// Configuration for building the scorers behind a decision engine.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub mode: ScoringMode,
    /// Bearer token for the inference API. Missing keys are not rejected
    /// here; the provider reports an auth failure on first call.
    pub api_key: Option<SecretString>,
    /// Base URL; the model id is appended as a path.
    pub api_base: String,
    pub zero_shot_model: String,
    /// `None` disables the phishing cascade.
    pub phishing_model: Option<String>,
    /// `None` disables the toxicity check.
    pub toxicity_model: Option<String>,
    /// Phishing-model labels that mean spam.
    pub phishing_labels: Vec<String>,
    /// Toxicity-model label compared against the threshold.
    pub toxic_label: String,
    pub multi_label: bool,
    pub timeout: Duration,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::Remote,
            api_key: None,
            api_base: "https://api-inference.huggingface.co/models".to_string(),
            zero_shot_model: "joeddav/xlm-roberta-large-xnli".to_string(),
            phishing_model: Some("ealvaradob/bert-finetuned-phishing".to_string()),
            toxicity_model: Some("unitary/multilingual-toxic-xlm-roberta".to_string()),
            phishing_labels: vec!["phishing".to_string(), "spam".to_string()],
            toxic_label: "toxic".to_string(),
            multi_label: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ScoringConfig {
    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), model)
    }

    fn http_scorer(
        &self,
        name: &str,
        model: &str,
        shape: ResponseShape,
        client: &reqwest::Client,
    ) -> Arc<HttpScorer> {
        let config = HttpScorerConfig {
            name: name.to_string(),
            endpoint: self.endpoint(model),
            api_key: self.api_key.clone(),
            shape,
            multi_label: self.multi_label,
        };
        Arc::new(HttpScorer::with_client(config, client.clone()))
    }
}

/// Build a decision engine wired to the configured scorers.
pub fn create_engine(
    config: &ScoringConfig,
    labels: CandidateLabelSet,
) -> Result<DecisionEngine, ConfigError> {
    match config.mode {
        ScoringMode::Local => {
            tracing::info!("Using local heuristic scorer");
            let scorer = Arc::new(HeuristicScorer::new(labels.clone()));
            Ok(DecisionEngine::new(scorer).with_labels(labels))
        }
        ScoringMode::Remote => create_remote_engine(config, labels),
    }
}

fn create_remote_engine(
    config: &ScoringConfig,
    labels: CandidateLabelSet,
) -> Result<DecisionEngine, ConfigError> {
    if config.api_key.is_none() {
        tracing::warn!("No inference API key configured; hosted providers will reject requests");
    }

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let primary = config.http_scorer(
        "zero-shot",
        &config.zero_shot_model,
        ResponseShape::ZeroShot,
        &client,
    );
    tracing::info!(model = %config.zero_shot_model, "Using zero-shot provider");
    let mut engine = DecisionEngine::new(primary).with_labels(labels);

    if let Some(ref model) = config.phishing_model {
        tracing::info!(model = %model, "Phishing cascade enabled");
        engine = engine.with_phishing(PhishingCheck {
            scorer: config.http_scorer("phishing", model, ResponseShape::ClassificationHead, &client),
            spam_labels: config.phishing_labels.clone(),
        });
    }

    if let Some(ref model) = config.toxicity_model {
        tracing::info!(model = %model, "Toxicity check enabled");
        engine = engine.with_toxicity(ToxicityCheck {
            scorer: config.http_scorer("toxicity", model, ResponseShape::ClassificationHead, &client),
            toxic_label: config.toxic_label.clone(),
        });
    }

    Ok(engine)
}

/// One label and the score a provider gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub label: String,
    pub score: f32,
}

impl ScoreResult {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A provider that scores text against a set of labels.
#[async_trait]
pub trait LabelScorer: Send + Sync {
    /// Provider name for logging and error reporting.
    fn name(&self) -> &str;

    /// Score `text` against `labels`.
    ///
    /// Classification-head providers ignore `labels` and return their own
    /// fixed label set.
    async fn score(&self, text: &str, labels: &[String]) -> Result<Vec<ScoreResult>, ProviderError>;
}

/// The first maximum-scoring result, in response order.
///
/// Later results only win when strictly greater, so ties go to the earlier
/// entry. NaN never wins.
pub fn top_result(results: &[ScoreResult]) -> Option<&ScoreResult> {
    let mut best: Option<&ScoreResult> = None;
    for result in results {
        match best {
            Some(current) if result.score > current.score => best = Some(result),
            None if !result.score.is_nan() => best = Some(result),
            _ => {}
        }
    }
    best
}

/// Score of the first result whose label matches `label` (ASCII case-insensitive).
pub fn score_of(results: &[ScoreResult], label: &str) -> Option<f32> {
    results
        .iter()
        .find(|r| r.label.eq_ignore_ascii_case(label))
        .map(|r| r.score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_result_picks_maximum() {
        let results = vec![
            ScoreResult::new("a", 0.2),
            ScoreResult::new("b", 0.7),
            ScoreResult::new("c", 0.1),
        ];
        assert_eq!(top_result(&results).unwrap().label, "b");
    }

    #[test]
    fn top_result_first_maximum_wins_ties() {
        let results = vec![
            ScoreResult::new("first", 0.5),
            ScoreResult::new("second", 0.5),
        ];
        assert_eq!(top_result(&results).unwrap().label, "first");
    }

    #[test]
    fn top_result_skips_nan() {
        let results = vec![ScoreResult::new("bad", f32::NAN), ScoreResult::new("ok", 0.1)];
        assert_eq!(top_result(&results).unwrap().label, "ok");
    }

    #[test]
    fn top_result_empty() {
        assert!(top_result(&[]).is_none());
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let config = ScoringConfig {
            api_base: "http://localhost:9000/models/".into(),
            ..ScoringConfig::default()
        };
        assert_eq!(
            config.endpoint("org/model"),
            "http://localhost:9000/models/org/model"
        );
    }

    #[test]
    fn remote_engine_builds_without_api_key() {
        let engine = create_engine(&ScoringConfig::default(), CandidateLabelSet::default());
        assert!(engine.is_ok());
    }

    #[tokio::test]
    async fn local_engine_needs_no_network() {
        use crate::pipeline::types::{Category, Email};

        let config = ScoringConfig {
            mode: ScoringMode::Local,
            ..ScoringConfig::default()
        };
        let engine = create_engine(&config, CandidateLabelSet::default()).unwrap();
        let outcome = engine
            .decide(&Email::new("1", "Abri um ticket sobre o erro no relatório"))
            .await
            .unwrap();
        assert_eq!(outcome.category, Category::Productive);
    }

    #[test]
    fn score_of_is_case_insensitive() {
        let results = vec![ScoreResult::new("TOXIC", 0.91), ScoreResult::new("insult", 0.3)];
        assert_eq!(score_of(&results, "toxic"), Some(0.91));
        assert_eq!(score_of(&results, "threat"), None);
    }
}

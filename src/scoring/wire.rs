//! Wire formats for hosted inference endpoints.
//!
//! Each provider declares its [`ResponseShape`] up front; the parser for
//! that shape turns the body into the common `ScoreResult` list.

use serde::{Deserialize, Serialize};

use super::ScoreResult;
use crate::error::ProviderError;

/// Which JSON shape a provider answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"labels": [...], "scores": [...]}` parallel arrays, descending by score.
    ZeroShot,
    /// `[[{"label": ..., "score": ...}, ...]]` from a classification head.
    ClassificationHead,
}

impl ResponseShape {
    /// Parse a response body into normalized score results.
    pub fn parse(&self, provider: &str, body: &[u8]) -> Result<Vec<ScoreResult>, ProviderError> {
        let results = match self {
            Self::ZeroShot => parse_zero_shot(provider, body)?,
            Self::ClassificationHead => parse_classification_head(provider, body)?,
        };

        if let Some(bad) = results.iter().find(|r| !r.score.is_finite()) {
            return Err(invalid(
                provider,
                format!("non-finite score for label '{}'", bad.label),
            ));
        }
        Ok(results)
    }

    /// Whether requests to this provider carry candidate labels.
    pub fn takes_candidate_labels(&self) -> bool {
        matches!(self, Self::ZeroShot)
    }
}

// ── Request ─────────────────────────────────────────────────────────

/// Request body for an inference endpoint.
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ZeroShotParameters<'a>>,
}

/// Zero-shot request parameters.
#[derive(Debug, Serialize)]
pub struct ZeroShotParameters<'a> {
    pub candidate_labels: &'a [String],
    pub multi_label: bool,
}

impl<'a> InferenceRequest<'a> {
    /// Build the request for a provider of the given shape.
    pub fn for_shape(
        shape: ResponseShape,
        inputs: &'a str,
        labels: &'a [String],
        multi_label: bool,
    ) -> Self {
        let parameters = shape.takes_candidate_labels().then_some(ZeroShotParameters {
            candidate_labels: labels,
            multi_label,
        });
        Self { inputs, parameters }
    }
}

// ── Responses ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

/// Classification heads usually nest one list per input; some deployments
/// return the inner list directly.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationHeadResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

fn parse_zero_shot(provider: &str, body: &[u8]) -> Result<Vec<ScoreResult>, ProviderError> {
    let response: ZeroShotResponse = serde_json::from_slice(body)
        .map_err(|e| invalid(provider, format!("zero-shot body: {e}")))?;

    if response.labels.len() != response.scores.len() {
        return Err(invalid(
            provider,
            format!(
                "{} labels but {} scores",
                response.labels.len(),
                response.scores.len()
            ),
        ));
    }

    Ok(response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| ScoreResult { label, score })
        .collect())
}

fn parse_classification_head(
    provider: &str,
    body: &[u8],
) -> Result<Vec<ScoreResult>, ProviderError> {
    let response: ClassificationHeadResponse = serde_json::from_slice(body)
        .map_err(|e| invalid(provider, format!("classification body: {e}")))?;

    let scores = match response {
        ClassificationHeadResponse::Nested(outer) => {
            outer.into_iter().next().ok_or_else(|| invalid(provider, "empty outer list".into()))?
        }
        ClassificationHeadResponse::Flat(inner) => inner,
    };

    Ok(scores
        .into_iter()
        .map(|s| ScoreResult {
            label: s.label,
            score: s.score,
        })
        .collect())
}

fn invalid(provider: &str, reason: String) -> ProviderError {
    ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_shot_shape_normalizes() {
        let body = br#"{"sequence": "x", "labels": ["a", "b"], "scores": [0.6, 0.4]}"#;
        let results = ResponseShape::ZeroShot.parse("zs", body).unwrap();
        assert_eq!(
            results,
            vec![ScoreResult::new("a", 0.6), ScoreResult::new("b", 0.4)]
        );
    }

    #[test]
    fn classification_head_shape_normalizes() {
        let body = br#"[[{"label": "toxic", "score": 0.9}]]"#;
        let results = ResponseShape::ClassificationHead.parse("tox", body).unwrap();
        assert_eq!(results, vec![ScoreResult::new("toxic", 0.9)]);
    }

    #[test]
    fn classification_head_accepts_flat_list() {
        let body = br#"[{"label": "phishing", "score": 0.97}, {"label": "benign", "score": 0.03}]"#;
        let results = ResponseShape::ClassificationHead.parse("ph", body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "phishing");
    }

    #[test]
    fn zero_shot_rejects_mismatched_arrays() {
        let body = br#"{"labels": ["a", "b"], "scores": [0.6]}"#;
        let err = ResponseShape::ZeroShot.parse("zs", body).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
        assert!(err.to_string().contains("2 labels but 1 scores"));
    }

    #[test]
    fn zero_shot_rejects_missing_fields() {
        let body = br#"{"error": "Model is currently loading"}"#;
        assert!(ResponseShape::ZeroShot.parse("zs", body).is_err());
    }

    #[test]
    fn shape_is_chosen_by_provider_not_sniffed() {
        let zero_shot_body = br#"{"labels": ["a"], "scores": [1.0]}"#;
        assert!(ResponseShape::ClassificationHead.parse("tox", zero_shot_body).is_err());

        let head_body = br#"[[{"label": "toxic", "score": 0.9}]]"#;
        assert!(ResponseShape::ZeroShot.parse("zs", head_body).is_err());
    }

    #[test]
    fn classification_head_rejects_empty_outer_list() {
        assert!(ResponseShape::ClassificationHead.parse("tox", b"[]").is_err());
        assert!(ResponseShape::ClassificationHead.parse("tox", b"{}").is_err());

        let results = ResponseShape::ClassificationHead.parse("tox", b"[[]]").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn zero_shot_request_carries_labels() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let request = InferenceRequest::for_shape(ResponseShape::ZeroShot, "hello", &labels, false);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inputs": "hello",
                "parameters": {"candidate_labels": ["a", "b"], "multi_label": false}
            })
        );
    }

    #[test]
    fn classification_head_request_omits_parameters() {
        let labels = vec!["ignored".to_string()];
        let request =
            InferenceRequest::for_shape(ResponseShape::ClassificationHead, "hello", &labels, false);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"inputs": "hello"}));
    }
}

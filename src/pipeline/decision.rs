//! Decision engine: turns one email into a category and a confidence.
//!
//! Flow:
//! 1. Keyword overrides (no provider call) → may short-circuit
//! 2. Primary zero-shot provider → top label over the candidate set
//! 3. Phishing cascade when the primary is unsure
//! 4. Toxicity check, which overrides 2 and 3

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::pipeline::rules::{KEYWORD_CONFIDENCE, KeywordRules};
use crate::pipeline::types::{CandidateLabelSet, Category, ClassificationOutcome, Email};
use crate::scoring::{LabelScorer, score_of, top_result};

/// Score thresholds for the cascade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionThresholds {
    /// Confidence reported for keyword overrides.
    pub keyword_confidence: f32,
    /// Primary confidence strictly below this triggers the phishing check.
    pub cascade_below: f32,
    /// Phishing score must be strictly above this to force `spam`.
    pub phishing_above: f32,
    /// Toxic score must be strictly above this to force `offensive`.
    pub toxic_above: f32,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            keyword_confidence: KEYWORD_CONFIDENCE,
            cascade_below: 0.75,
            phishing_above: 0.85,
            toxic_above: 0.7,
        }
    }
}

/// Secondary provider that flags phishing/spam.
pub struct PhishingCheck {
    pub scorer: Arc<dyn LabelScorer>,
    /// Labels from this provider that mean "phishing or spam".
    pub spam_labels: Vec<String>,
}

/// Tertiary provider that flags toxic content.
pub struct ToxicityCheck {
    pub scorer: Arc<dyn LabelScorer>,
    /// The label whose score is compared against the toxicity threshold.
    pub toxic_label: String,
}

/// Combines keyword overrides, provider scores and cascade rules.
pub struct DecisionEngine {
    rules: KeywordRules,
    labels: CandidateLabelSet,
    primary: Arc<dyn LabelScorer>,
    phishing: Option<PhishingCheck>,
    toxicity: Option<ToxicityCheck>,
    thresholds: DecisionThresholds,
}

impl DecisionEngine {
    /// Create an engine with the default keyword rules, candidate labels
    /// and thresholds, and no cascade providers.
    pub fn new(primary: Arc<dyn LabelScorer>) -> Self {
        Self {
            rules: KeywordRules::default_rules(),
            labels: CandidateLabelSet::default(),
            primary,
            phishing: None,
            toxicity: None,
            thresholds: DecisionThresholds::default(),
        }
    }

    /// Replace the keyword rules. Their confidence is taken from the
    /// engine's `keyword_confidence` threshold.
    pub fn with_rules(mut self, rules: KeywordRules) -> Self {
        self.rules = rules.with_confidence(self.thresholds.keyword_confidence);
        self
    }

    pub fn with_labels(mut self, labels: CandidateLabelSet) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_phishing(mut self, check: PhishingCheck) -> Self {
        self.phishing = Some(check);
        self
    }

    pub fn with_toxicity(mut self, check: ToxicityCheck) -> Self {
        self.toxicity = Some(check);
        self
    }

    pub fn with_thresholds(mut self, thresholds: DecisionThresholds) -> Self {
        self.thresholds = thresholds;
        self.rules = self.rules.with_confidence(thresholds.keyword_confidence);
        self
    }

    /// Classify one email.
    pub async fn decide(&self, email: &Email) -> Result<ClassificationOutcome, ProviderError> {
        if let Some(outcome) = self.rules.evaluate(&email.text) {
            debug!(id = %email.id, category = %outcome.category, "Keyword override, skipping providers");
            return Ok(outcome);
        }

        let mut outcome = self.primary_outcome(email).await?;

        if outcome.category != Category::Spam && outcome.confidence < self.thresholds.cascade_below {
            if let Some(ref check) = self.phishing {
                outcome = self.apply_phishing(email, check, outcome).await?;
            }
        }

        if let Some(ref check) = self.toxicity {
            outcome = self.apply_toxicity(email, check, outcome).await?;
        }

        info!(
            id = %email.id,
            category = %outcome.category,
            confidence = outcome.confidence,
            "Email classified"
        );
        Ok(outcome)
    }

    async fn primary_outcome(&self, email: &Email) -> Result<ClassificationOutcome, ProviderError> {
        let scores = self.primary.score(&email.text, &self.labels.texts()).await?;

        // Labels outside the candidate set cannot be mapped to a category.
        let known: Vec<_> = scores
            .into_iter()
            .filter(|s| {
                let mapped = self.labels.category_for(&s.label).is_some();
                if !mapped {
                    warn!(provider = self.primary.name(), label = %s.label, "Ignoring unknown label");
                }
                mapped
            })
            .collect();

        let outcome = top_result(&known)
            .and_then(|top| {
                self.labels
                    .category_for(&top.label)
                    .map(|category| ClassificationOutcome::new(category, top.score))
            })
            .unwrap_or_else(|| {
                warn!(id = %email.id, "No known label returned, falling back to default reply");
                ClassificationOutcome::unmatched()
            });

        debug!(
            id = %email.id,
            category = %outcome.category,
            confidence = outcome.confidence,
            "Primary provider decision"
        );
        Ok(outcome)
    }

    async fn apply_phishing(
        &self,
        email: &Email,
        check: &PhishingCheck,
        outcome: ClassificationOutcome,
    ) -> Result<ClassificationOutcome, ProviderError> {
        let scores = check.scorer.score(&email.text, &[]).await?;
        let Some(top) = top_result(&scores) else {
            return Ok(outcome);
        };

        let is_spam = check
            .spam_labels
            .iter()
            .any(|l| l.eq_ignore_ascii_case(&top.label));

        if is_spam && top.score > self.thresholds.phishing_above {
            debug!(id = %email.id, score = top.score, "Phishing cascade flagged spam");
            return Ok(ClassificationOutcome::new(Category::Spam, top.score));
        }
        Ok(outcome)
    }

    async fn apply_toxicity(
        &self,
        email: &Email,
        check: &ToxicityCheck,
        outcome: ClassificationOutcome,
    ) -> Result<ClassificationOutcome, ProviderError> {
        let scores = check.scorer.score(&email.text, &[]).await?;
        match score_of(&scores, &check.toxic_label) {
            Some(score) if score > self.thresholds.toxic_above => {
                debug!(id = %email.id, score, "Toxicity check flagged offensive");
                Ok(ClassificationOutcome::new(Category::Offensive, score))
            }
            _ => Ok(outcome),
        }
    }
}

//! Email processor: classifies emails and attaches replies.
//!
//! Flow per batch:
//! 1. Decision engine runs for each email (bounded concurrency, input order kept)
//! 2. Replies are drawn in input order from the shared RNG
//! 3. Results are aggregated into per-category counts
//!
//! The first provider error fails the whole batch.

use std::sync::Mutex;

use futures::stream::{self, StreamExt, TryStreamExt};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::error::ProviderError;
use crate::pipeline::decision::DecisionEngine;
use crate::pipeline::replies::ReplySelector;
use crate::pipeline::types::{
    BatchOutcome, ClassificationOutcome, ClassificationResult, Email, aggregate,
};

/// Default number of emails decided concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Classifies emails and picks replies.
pub struct EmailProcessor {
    engine: DecisionEngine,
    replies: ReplySelector,
    rng: Mutex<StdRng>,
    max_concurrency: usize,
}

impl EmailProcessor {
    /// Create a processor. `seed` fixes the reply RNG; `None` seeds from entropy.
    pub fn new(engine: DecisionEngine, replies: ReplySelector, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            engine,
            replies,
            rng: Mutex::new(rng),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Limit how many emails are decided at once (minimum 1).
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Classify one email.
    pub async fn process(&self, email: Email) -> Result<ClassificationResult, ProviderError> {
        let outcome = self.engine.decide(&email).await?;
        Ok(self.attach_reply(email, outcome))
    }

    /// Classify a batch and count categories.
    pub async fn process_batch(&self, emails: Vec<Email>) -> Result<BatchOutcome, ProviderError> {
        let count = emails.len();
        info!(count, "Processing email batch");

        let decided: Vec<(Email, ClassificationOutcome)> = stream::iter(emails)
            .map(|email| async move {
                let outcome = self.engine.decide(&email).await?;
                Ok::<_, ProviderError>((email, outcome))
            })
            .buffered(self.max_concurrency)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| {
                error!(provider = e.provider(), error = %e, "Batch failed on provider error");
                e
            })?;

        let results: Vec<ClassificationResult> = decided
            .into_iter()
            .map(|(email, outcome)| self.attach_reply(email, outcome))
            .collect();
        let summary = aggregate(&results);

        info!(processed = results.len(), total = count, "Batch processing complete");
        Ok(BatchOutcome { results, summary })
    }

    fn attach_reply(&self, email: Email, outcome: ClassificationOutcome) -> ClassificationResult {
        let reply = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            self.replies.reply_for_outcome(&outcome, &email.text, &mut *rng)
        };
        debug!(id = %email.id, category = %outcome.category, "Reply selected");
        ClassificationResult::new(email, outcome, reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::pipeline::replies::DEFAULT_REPLY;
    use crate::pipeline::types::{CandidateLabelSet, Category};
    use crate::scoring::{HeuristicScorer, LabelScorer, ScoreResult};

    fn heuristic_processor(seed: u64) -> EmailProcessor {
        let scorer = Arc::new(HeuristicScorer::new(CandidateLabelSet::default()));
        EmailProcessor::new(
            DecisionEngine::new(scorer),
            ReplySelector::default_replies(),
            Some(seed),
        )
    }

    /// Returns the spam label for any text containing "ganhe", productive otherwise.
    struct KeywordScorer;

    #[async_trait]
    impl LabelScorer for KeywordScorer {
        fn name(&self) -> &str {
            "keyword-stub"
        }

        async fn score(
            &self,
            text: &str,
            labels: &[String],
        ) -> Result<Vec<ScoreResult>, ProviderError> {
            let winner = if text.contains("ganhe") { 2 } else { 0 };
            Ok(labels
                .iter()
                .enumerate()
                .map(|(i, l)| ScoreResult::new(l.clone(), if i == winner { 0.9 } else { 0.03 }))
                .collect())
        }
    }

    struct BrokenScorer;

    #[async_trait]
    impl LabelScorer for BrokenScorer {
        fn name(&self) -> &str {
            "broken"
        }

        async fn score(
            &self,
            _text: &str,
            _labels: &[String],
        ) -> Result<Vec<ScoreResult>, ProviderError> {
            Err(ProviderError::InvalidResponse {
                provider: "broken".into(),
                reason: "missing labels".into(),
            })
        }
    }

    #[tokio::test]
    async fn batch_keeps_input_order_and_counts() {
        let processor = EmailProcessor::new(
            DecisionEngine::new(Arc::new(KeywordScorer)),
            ReplySelector::default_replies(),
            Some(1),
        )
        .with_max_concurrency(3);

        let emails = vec![
            Email::new("a", "Preciso de ajuda com o login"),
            Email::new("b", "Ganhe um iPhone, ganhe agora"),
            Email::new("c", "Reunião remarcada para quinta"),
            Email::new("d", "Feliz Natal!"),
        ];

        let batch = processor.process_batch(emails).await.unwrap();
        let ids: Vec<_> = batch.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d"]);

        let categories: Vec<_> = batch.results.iter().map(|r| r.category).collect();
        assert_eq!(
            categories,
            [
                Category::Productive,
                Category::Spam,
                Category::Productive,
                Category::Unproductive
            ]
        );
        assert_eq!(batch.summary.count(Category::Productive), 2);
        assert_eq!(batch.summary.count(Category::Spam), 1);
        assert_eq!(batch.summary.count(Category::Unproductive), 1);
        assert_eq!(batch.summary.count(Category::Offensive), 0);
    }

    #[tokio::test]
    async fn fixed_seed_gives_reproducible_replies() {
        let emails = vec![
            Email::new("1", "Podemos conversar sobre o orçamento?"),
            Email::new("2", "Reunião remarcada para quinta"),
            Email::new("3", "Segue o cardápio"),
        ];

        let first = heuristic_processor(2024)
            .process_batch(emails.clone())
            .await
            .unwrap();
        let second = heuristic_processor(2024).process_batch(emails).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn replies_come_from_category_templates() {
        let processor = heuristic_processor(5);
        let selector = ReplySelector::default_replies();

        let result = processor
            .process(Email::new("x", "Segue o cardápio do almoço"))
            .await
            .unwrap();
        assert_eq!(result.category, Category::Unproductive);
        assert!(selector
            .candidates(result.category, &result.text)
            .contains(&result.reply));
    }

    #[tokio::test]
    async fn process_keeps_email_fields() {
        let processor = heuristic_processor(5);
        let result = processor
            .process(Email::new("42", "Qual o status?").with_name("Carla"))
            .await
            .unwrap();
        assert_eq!(result.id, "42");
        assert_eq!(result.name.as_deref(), Some("Carla"));
        assert_eq!(result.text, "Qual o status?");
        assert_eq!(result.category, Category::Productive);
        assert_eq!(result.confidence, 0.90);
    }

    /// Answers only with labels outside the candidate set.
    struct OffTopicScorer;

    #[async_trait]
    impl LabelScorer for OffTopicScorer {
        fn name(&self) -> &str {
            "off-topic"
        }

        async fn score(
            &self,
            _text: &str,
            _labels: &[String],
        ) -> Result<Vec<ScoreResult>, ProviderError> {
            Ok(vec![ScoreResult::new("weather report", 0.9)])
        }
    }

    #[tokio::test]
    async fn unmatched_label_gets_default_reply() {
        let processor = EmailProcessor::new(
            DecisionEngine::new(Arc::new(OffTopicScorer)),
            ReplySelector::default_replies(),
            Some(1),
        );

        let result = processor
            .process(Email::new("1", "Segue a planilha do trimestre"))
            .await
            .unwrap();
        assert_eq!(result.category, Category::Unproductive);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reply, DEFAULT_REPLY);

        let batch = processor
            .process_batch(vec![Email::new("2", "Segue a planilha do trimestre")])
            .await
            .unwrap();
        assert_eq!(batch.results[0].reply, DEFAULT_REPLY);
        assert_eq!(batch.summary.count(Category::Unproductive), 1);
    }

    #[tokio::test]
    async fn provider_error_fails_batch() {
        let processor = EmailProcessor::new(
            DecisionEngine::new(Arc::new(BrokenScorer)),
            ReplySelector::default_replies(),
            None,
        );
        let err = processor
            .process_batch(vec![Email::new("1", "Reunião amanhã")])
            .await
            .unwrap_err();
        assert_eq!(err.provider(), "broken");
    }

    #[tokio::test]
    async fn empty_batch_reports_zero_counts() {
        let batch = heuristic_processor(0).process_batch(Vec::new()).await.unwrap();
        assert!(batch.results.is_empty());
        for category in Category::ALL {
            assert_eq!(batch.summary.count(category), 0);
        }
    }
}

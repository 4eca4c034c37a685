//! Offline scorer based on hint-word counts.
//!
//! Lets the service run without a hosted model. Only the productive and
//! unproductive labels ever get a non-zero score.

use async_trait::async_trait;

use super::{LabelScorer, ScoreResult};
use crate::error::ProviderError;
use crate::pipeline::types::{CandidateLabelSet, Category};

const PRODUCTIVE_HINTS: &[&str] = &[
    "status", "atualiza", "andamento", "suporte", "erro", "problema", "ticket", "urgente",
];

const UNPRODUCTIVE_HINTS: &[&str] = &["feliz natal", "bom dia", "boa tarde", "parabéns", "obrigado"];

const BASE_CONFIDENCE: f32 = 0.55;
const CONFIDENCE_STEP: f32 = 0.1;
const MAX_CONFIDENCE: f32 = 0.95;

/// Keyword-count scorer.
pub struct HeuristicScorer {
    labels: CandidateLabelSet,
}

impl HeuristicScorer {
    /// `labels` maps the label strings the engine sends back to categories.
    pub fn new(labels: CandidateLabelSet) -> Self {
        Self { labels }
    }

    /// Winning category and its confidence for `text`.
    ///
    /// Confidence grows with the winner's lead, not the signed
    /// productive-minus-unproductive count, so an unproductive winner never
    /// scores below its productive complement.
    pub fn judge(text: &str) -> (Category, f32) {
        let lower = text.to_lowercase();
        let count = |hints: &[&str]| hints.iter().filter(|h| lower.contains(*h)).count();
        let productive = count(PRODUCTIVE_HINTS);
        let unproductive = count(UNPRODUCTIVE_HINTS);

        let (category, margin) = if productive >= unproductive.max(1) {
            (Category::Productive, productive - unproductive)
        } else {
            (Category::Unproductive, unproductive - productive)
        };

        // The winner always ends up at or above 0.5.
        let margin = margin as f32;
        let confidence = (BASE_CONFIDENCE + CONFIDENCE_STEP * margin).clamp(0.0, MAX_CONFIDENCE);
        (category, confidence)
    }
}

#[async_trait]
impl LabelScorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn score(&self, text: &str, labels: &[String]) -> Result<Vec<ScoreResult>, ProviderError> {
        let (winner, confidence) = Self::judge(text);

        let results = labels
            .iter()
            .map(|label| {
                let score = match self.labels.category_for(label) {
                    Some(category) if category == winner => confidence,
                    Some(Category::Productive | Category::Unproductive) => 1.0 - confidence,
                    _ => 0.0,
                };
                ScoreResult::new(label.clone(), score)
            })
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::top_result;

    #[test]
    fn productive_hints_win() {
        let (category, confidence) = HeuristicScorer::judge("Erro no sistema, abri um ticket");
        assert_eq!(category, Category::Productive);
        assert!((confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn unproductive_hints_win() {
        let (category, confidence) = HeuristicScorer::judge("Feliz Natal e obrigado por tudo!");
        assert_eq!(category, Category::Unproductive);
        assert!((confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn no_hints_is_unproductive() {
        let (category, confidence) = HeuristicScorer::judge("Segue o cardápio do almoço");
        assert_eq!(category, Category::Unproductive);
        assert!((confidence - 0.55).abs() < 1e-6);
    }

    #[test]
    fn confidence_is_capped() {
        let text = "status atualiza andamento suporte erro problema ticket urgente";
        let (_, confidence) = HeuristicScorer::judge(text);
        assert!((confidence - MAX_CONFIDENCE).abs() < 1e-6);
    }

    #[tokio::test]
    async fn scores_follow_candidate_labels() {
        let set = CandidateLabelSet::default();
        let scorer = HeuristicScorer::new(set.clone());
        let results = scorer
            .score("Qual o status do suporte?", &set.texts())
            .await
            .unwrap();

        assert_eq!(results.len(), set.len());
        let top = top_result(&results).unwrap();
        assert_eq!(set.category_for(&top.label), Some(Category::Productive));
        let spam_label = &set.texts()[2];
        assert_eq!(crate::scoring::score_of(&results, spam_label), Some(0.0));
    }
}

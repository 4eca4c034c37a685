//! Keyword override rules, checked before any provider call.
//!
//! Matching is a substring test against the normalized text:
//! - productive keywords → `productive`
//! - unproductive keywords → `unproductive`
//!
//! Productive keywords are checked first. When a rule fires the engine
//! returns immediately and no provider is contacted.

use tracing::debug;

use crate::pipeline::types::{Category, ClassificationOutcome};
use crate::text::normalize;

/// Confidence reported for a keyword override.
pub const KEYWORD_CONFIDENCE: f32 = 0.90;

/// A single keyword override.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    /// Lowercase keyword, matched as a substring of the normalized text.
    pub keyword: String,
    /// Category the rule forces.
    pub category: Category,
}

/// Pre-provider keyword rules.
#[derive(Debug, Clone)]
pub struct KeywordRules {
    productive: Vec<KeywordRule>,
    unproductive: Vec<KeywordRule>,
    confidence: f32,
}

impl KeywordRules {
    /// Rules with the default Portuguese keyword lists.
    pub fn default_rules() -> Self {
        let mut rules = Self::empty();
        for keyword in ["status", "atualização", "suporte", "problema", "ajuda"] {
            rules.add_keyword(keyword, Category::Productive);
        }
        for keyword in ["feliz natal", "boas festas", "parabéns", "felicitações"] {
            rules.add_keyword(keyword, Category::Unproductive);
        }
        rules
    }

    /// No rules at all; every email falls through to the providers.
    pub fn empty() -> Self {
        Self {
            productive: Vec::new(),
            unproductive: Vec::new(),
            confidence: KEYWORD_CONFIDENCE,
        }
    }

    /// Override the confidence reported when a rule fires. The decision
    /// engine sets this from its thresholds.
    pub(crate) fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Add a keyword. Only productive and unproductive overrides are
    /// supported; other categories are ignored.
    pub fn add_keyword(&mut self, keyword: &str, category: Category) {
        let rule = KeywordRule {
            keyword: keyword.to_lowercase(),
            category,
        };
        match category {
            Category::Productive => self.productive.push(rule),
            Category::Unproductive => self.unproductive.push(rule),
            Category::Spam | Category::Offensive => {
                debug!(keyword, category = %category, "Ignoring keyword for non-overridable category");
            }
        }
    }

    /// Evaluate raw email text.
    ///
    /// Returns `Some(outcome)` if a keyword matches (skip providers),
    /// `None` to fall through to provider scoring.
    pub fn evaluate(&self, text: &str) -> Option<ClassificationOutcome> {
        let normalized = normalize(text);

        for rules in [&self.productive, &self.unproductive] {
            if let Some(rule) = rules.iter().find(|r| normalized.contains(&r.keyword)) {
                debug!(
                    keyword = %rule.keyword,
                    category = %rule.category,
                    "Text matched keyword override"
                );
                return Some(ClassificationOutcome::new(rule.category, self.confidence));
            }
        }

        None
    }
}

impl Default for KeywordRules {
    fn default() -> Self {
        Self::default_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn productive_keyword_fires() {
        let rules = KeywordRules::default_rules();
        let outcome = rules.evaluate("Preciso de AJUDA com o acesso.").unwrap();
        assert_eq!(outcome.category, Category::Productive);
        assert_eq!(outcome.confidence, 0.90);
    }

    #[test]
    fn unproductive_keyword_fires() {
        let rules = KeywordRules::default_rules();
        let outcome = rules.evaluate("Feliz Natal para toda a equipe!").unwrap();
        assert_eq!(outcome.category, Category::Unproductive);
        assert_eq!(outcome.confidence, 0.90);
    }

    #[test]
    fn productive_checked_before_unproductive() {
        let rules = KeywordRules::default_rules();
        let outcome = rules
            .evaluate("Parabéns pelo lançamento! Qual o status do meu pedido?")
            .unwrap();
        assert_eq!(outcome.category, Category::Productive);
    }

    #[test]
    fn keyword_matches_inside_words() {
        let rules = KeywordRules::default_rules();
        // "suporte" is a substring of "suportes"
        let outcome = rules.evaluate("Contato com os suportes técnicos").unwrap();
        assert_eq!(outcome.category, Category::Productive);
    }

    #[test]
    fn punctuation_does_not_block_multiword_keywords() {
        let rules = KeywordRules::default_rules();
        let outcome = rules.evaluate("Feliz... Natal!").unwrap();
        assert_eq!(outcome.category, Category::Unproductive);
    }

    #[test]
    fn no_match_falls_through() {
        let rules = KeywordRules::default_rules();
        assert!(rules.evaluate("Segue em anexo a planilha do trimestre").is_none());
        assert!(rules.evaluate("").is_none());
    }

    #[test]
    fn empty_rules_pass_everything() {
        let rules = KeywordRules::empty();
        assert!(rules.evaluate("status suporte problema").is_none());
    }

    #[test]
    fn custom_keyword_and_confidence() {
        let mut rules = KeywordRules::empty().with_confidence(0.8);
        rules.add_keyword("Fatura", Category::Productive);
        rules.add_keyword("golpe", Category::Spam);

        let outcome = rules.evaluate("Segunda via da fatura").unwrap();
        assert_eq!(outcome, ClassificationOutcome::new(Category::Productive, 0.8));
        assert!(rules.evaluate("isso é um golpe").is_none());
    }
}

//! Shared types for the classification pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Category ────────────────────────────────────────────────────────

/// The canonical category vocabulary.
///
/// Provider labels, keyword overrides, reply templates and batch counts all
/// speak in these four values and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Needs action or a reply (support requests, status inquiries).
    Productive,
    /// No action needed (greetings, thanks, chit-chat).
    Unproductive,
    /// Spam or phishing.
    Spam,
    /// Offensive or toxic content.
    Offensive,
}

impl Category {
    /// Every category, in reporting order.
    pub const ALL: [Category; 4] = [
        Category::Productive,
        Category::Unproductive,
        Category::Spam,
        Category::Offensive,
    ];

    /// Short label for logging and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Productive => "productive",
            Self::Unproductive => "unproductive",
            Self::Spam => "spam",
            Self::Offensive => "offensive",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Inbound email ───────────────────────────────────────────────────

/// An email submitted for classification. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Email {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// ── Candidate labels ────────────────────────────────────────────────

/// A hypothesis string presented to a zero-shot provider, bound to the
/// category it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLabel {
    pub text: String,
    pub category: Category,
}

/// Ordered set of candidate labels. Order is presentation only.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLabelSet {
    labels: Vec<CandidateLabel>,
}

impl CandidateLabelSet {
    pub fn new(labels: Vec<CandidateLabel>) -> Self {
        Self { labels }
    }

    /// Label texts in presentation order, as sent to the provider.
    pub fn texts(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.text.clone()).collect()
    }

    /// Map a provider-returned label back to its category.
    ///
    /// Matching ignores ASCII case and surrounding whitespace; some hosted
    /// models echo labels back with different casing.
    pub fn category_for(&self, label: &str) -> Option<Category> {
        let label = label.trim();
        self.labels
            .iter()
            .find(|l| l.text.eq_ignore_ascii_case(label))
            .map(|l| l.category)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CandidateLabelSet {
    fn default() -> Self {
        let label = |text: &str, category| CandidateLabel {
            text: text.to_string(),
            category,
        };
        Self::new(vec![
            label(
                "email de trabalho que requer ação ou resposta",
                Category::Productive,
            ),
            label(
                "mensagem social ou de cortesia sem ação necessária",
                Category::Unproductive,
            ),
            label("spam ou tentativa de phishing", Category::Spam),
            label("conteúdo ofensivo ou agressivo", Category::Offensive),
        ])
    }
}

// ── Outcomes ────────────────────────────────────────────────────────

/// The final decision for one email.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub category: Category,
    pub confidence: f32,
    /// Set when no provider label mapped to a category.
    #[serde(skip)]
    unmatched: bool,
}

impl ClassificationOutcome {
    pub fn new(category: Category, confidence: f32) -> Self {
        Self {
            category,
            confidence,
            unmatched: false,
        }
    }

    /// Outcome for an email no provider label could be mapped for.
    ///
    /// Counted as `unproductive` with zero confidence; replies use the
    /// generic default instead of a category template.
    pub fn unmatched() -> Self {
        Self {
            category: Category::Unproductive,
            confidence: 0.0,
            unmatched: true,
        }
    }

    pub fn is_unmatched(&self) -> bool {
        self.unmatched
    }
}

/// One classified email as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: String,
    pub text: String,
    pub name: Option<String>,
    pub category: Category,
    pub confidence: f32,
    pub reply: String,
}

impl ClassificationResult {
    pub fn new(email: Email, outcome: ClassificationOutcome, reply: String) -> Self {
        Self {
            id: email.id,
            text: email.text,
            name: email.name,
            category: outcome.category,
            confidence: outcome.confidence,
            reply,
        }
    }
}

// ── Batch summary ───────────────────────────────────────────────────

/// Per-category counts for one batch. Every category is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchSummary {
    counts: BTreeMap<Category, usize>,
}

impl BatchSummary {
    /// Count for a category (0 if none were seen).
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total number of classified emails.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self {
            counts: Category::ALL.iter().map(|c| (*c, 0)).collect(),
        }
    }
}

/// Count results per category.
pub fn aggregate(results: &[ClassificationResult]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for result in results {
        *summary.counts.entry(result.category).or_insert(0) += 1;
    }
    summary
}

/// Results plus counts for a processed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<ClassificationResult>,
    pub summary: BatchSummary,
}

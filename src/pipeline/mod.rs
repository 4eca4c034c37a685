//! Email classification pipeline.
//!
//! Every submitted email flows through:
//! 1. `KeywordRules::evaluate()`: keyword overrides on normalized text (no provider)
//! 2. `DecisionEngine::decide()`: zero-shot scoring plus phishing/toxicity cascade
//! 3. `ReplySelector::reply_for()`: contextual or templated reply
//! 4. `aggregate()`: per-category counts for the batch

pub mod decision;
pub mod processor;
pub mod replies;
pub mod rules;
pub mod types;

pub use decision::{DecisionEngine, DecisionThresholds, PhishingCheck, ToxicityCheck};
pub use processor::EmailProcessor;
pub use replies::ReplySelector;
pub use rules::KeywordRules;
pub use types::{
    BatchOutcome, BatchSummary, CandidateLabel, CandidateLabelSet, Category,
    ClassificationOutcome, ClassificationResult, Email, aggregate,
};

//! Email Classifier: categorizes emails and suggests replies.

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod scoring;
pub mod text;

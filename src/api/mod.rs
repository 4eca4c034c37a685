//! HTTP surface for the classifier.

pub mod routes;

pub use routes::{ApiState, ClassifyRequest, ClassifyResponse, EmailInput, classify_routes};

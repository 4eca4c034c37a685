//! REST endpoints for batch classification.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::ProviderError;
use crate::pipeline::processor::EmailProcessor;
use crate::pipeline::types::{BatchSummary, ClassificationResult, Email};

/// Shared state for the classification routes.
#[derive(Clone)]
pub struct ApiState {
    pub processor: Arc<EmailProcessor>,
}

// ── Request / response ──────────────────────────────────────────────

/// One submitted email: a full object, or a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EmailInput {
    Full(Email),
    Text(String),
}

impl EmailInput {
    /// Bare strings get their zero-based position as id.
    fn into_email(self, index: usize) -> Email {
        match self {
            Self::Full(email) => email,
            Self::Text(text) => Email::new(index.to_string(), text),
        }
    }
}

/// Body of `POST /api/classify`.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub emails: Vec<EmailInput>,
}

/// Response of `POST /api/classify`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub results: Vec<ClassificationResult>,
    pub summary: BatchSummary,
}

/// Provider failures surface as `502 Bad Gateway`.
pub struct ApiError(ProviderError);

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(provider = self.0.provider(), error = %self.0, "Classification request failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

// ── Handlers ────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "email-classifier"
    }))
}

/// POST /api/classify
///
/// Classifies every email in the batch and returns per-email results plus
/// per-category counts. Any provider failure fails the whole request.
async fn classify(
    State(state): State<ApiState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let emails: Vec<Email> = request
        .emails
        .into_iter()
        .enumerate()
        .map(|(i, input)| input.into_email(i))
        .collect();

    info!(count = emails.len(), "Classification request received");
    let batch = state.processor.process_batch(emails).await?;

    Ok(Json(ClassifyResponse {
        results: batch.results,
        summary: batch.summary,
    }))
}

// ── Router ──────────────────────────────────────────────────────────

/// CORS layer: permissive when no origins are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the Axum router with the classification and health routes.
pub fn classify_routes(processor: Arc<EmailProcessor>, cors_origins: &[String]) -> Router {
    let state = ApiState { processor };

    Router::new()
        .route("/health", get(health))
        .route("/api/classify", post(classify))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(cors_origins)),
        )
        .with_state(state)
}

use std::sync::Arc;

use anyhow::Context;

use email_classifier::api::classify_routes;
use email_classifier::config::AppConfig;
use email_classifier::pipeline::{CandidateLabelSet, EmailProcessor, ReplySelector};
use email_classifier::scoring::{ScoringMode, create_engine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    eprintln!("📬 Email Classifier v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://{}/api/classify", config.bind);
    match config.scoring.mode {
        ScoringMode::Local => eprintln!("   Scoring: local heuristics"),
        ScoringMode::Remote => {
            eprintln!("   Scoring: {}", config.scoring.zero_shot_model);
            eprintln!(
                "   Phishing cascade: {}",
                config.scoring.phishing_model.as_deref().unwrap_or("disabled")
            );
            eprintln!(
                "   Toxicity check: {}",
                config.scoring.toxicity_model.as_deref().unwrap_or("disabled")
            );
        }
    }
    eprintln!(
        "   CORS: {}\n",
        if config.cors_origins.is_empty() {
            "any origin".to_string()
        } else {
            config.cors_origins.join(", ")
        }
    );

    // ── Pipeline ────────────────────────────────────────────────────────
    let engine = create_engine(&config.scoring, CandidateLabelSet::default())?;
    let processor = Arc::new(
        EmailProcessor::new(engine, ReplySelector::default_replies(), config.reply_seed)
            .with_max_concurrency(config.max_concurrency),
    );

    // ── HTTP server ─────────────────────────────────────────────────────
    let app = classify_routes(processor, &config.cors_origins);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "Classifier server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Classifier server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

//! HTTP server binary for the assessment recommendation engine.
//!
//! Startup sequence:
//! 1. Load the persisted embedding index, or rebuild it from the catalog
//! 2. Wire the optional LLM reranker from `GEMINI_API_KEY`
//! 3. Serve `GET /health` and `POST /recommend`
//!
//! A failed index bootstrap logs and serves in degraded mode (empty
//! recommendations) rather than exiting; health probes keep passing so
//! an operator can fix the data without fighting a crash loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use embedding::{HashingEncoder, TextEncoder};
use llm_client::GeminiClient;
use rerank::LlmReranker;
use server::{RecommendationOrchestrator, create_router, load_or_build_index};

/// Assessment recommendation HTTP server
#[derive(Parser)]
#[command(name = "assess-recs-server")]
#[command(about = "Serves assessment recommendations over HTTP", long_about = None)]
struct Args {
    /// Path to the scraped assessment catalog
    #[arg(long, default_value = "data/scraped_data.json")]
    catalog: PathBuf,

    /// Path to the persisted embedding index artifact
    #[arg(long, default_value = "data/index.json")]
    index: PathBuf,

    /// Address to bind the HTTP listener to
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Generative-language model used for reranking
    #[arg(long, default_value = "gemini-2.0-flash")]
    model: String,

    /// Upper bound on a single LLM rerank call, in seconds
    #[arg(long, default_value = "30")]
    rerank_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,server=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Starting assessment recommendation server");

    let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::default());

    let reranker = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            info!("LLM rerank enabled with model {}", args.model);
            let client = GeminiClient::new(key, args.model.clone())?;
            Some(LlmReranker::new(Arc::new(client)))
        }
        _ => {
            warn!("GEMINI_API_KEY not set, serving without LLM rerank");
            None
        }
    };

    let orchestrator = match load_or_build_index(encoder.as_ref(), &args.catalog, &args.index) {
        Ok(index) => {
            info!("Index ready with {} assessments", index.len());
            RecommendationOrchestrator::new(Arc::clone(&encoder), index, reranker)
                .with_rerank_timeout(Duration::from_secs(args.rerank_timeout_secs))
        }
        Err(e) => {
            warn!("Index bootstrap failed, serving degraded: {e:#}");
            RecommendationOrchestrator::degraded(encoder)
        }
    };

    let app = create_router(Arc::new(orchestrator));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding to {}", args.bind))?;
    info!("Listening on {}", args.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

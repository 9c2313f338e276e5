//! Operator CLI for the assessment recommendation engine.
//!
//! Subcommands:
//! - `build`: build the embedding index from the catalog and save it
//! - `recommend`: run the full pipeline for a query
//! - `search`: raw vector search, no diversity or LLM stage

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::warn;

use catalog::load_catalog;
use embedding::{EmbeddingIndex, HashingEncoder, TextEncoder};
use llm_client::GeminiClient;
use rerank::LlmReranker;
use server::{Recommendation, RecommendationOrchestrator, load_or_build_index};

/// Assessment recommendation engine
#[derive(Parser)]
#[command(name = "assess-recs")]
#[command(about = "Recommends assessments for a hiring query", long_about = None)]
struct Cli {
    /// Path to the scraped assessment catalog
    #[arg(long, default_value = "data/scraped_data.json")]
    catalog: PathBuf,

    /// Path to the persisted embedding index artifact
    #[arg(long, default_value = "data/index.json")]
    index: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the embedding index from the catalog and save it
    Build,

    /// Get assessment recommendations for a query
    Recommend {
        /// Natural-language query or job description
        #[arg(long)]
        query: String,

        /// Number of recommendations to return (clamped to 5..=10)
        #[arg(long, default_value = "10")]
        k: usize,

        /// Skip the LLM refinement stage
        #[arg(long)]
        no_rerank: bool,
    },

    /// Raw vector search against the index, bypassing reranking
    Search {
        /// Query text
        #[arg(long)]
        query: String,

        /// Number of results
        #[arg(long, default_value = "10")]
        n: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let encoder = HashingEncoder::default();

    match cli.command {
        Commands::Build => handle_build(&encoder, &cli.catalog, &cli.index)?,
        Commands::Recommend { query, k, no_rerank } => {
            handle_recommend(encoder, &cli.catalog, &cli.index, &query, k, no_rerank).await?
        }
        Commands::Search { query, n } => {
            handle_search(&encoder, &cli.catalog, &cli.index, &query, n)?
        }
    }

    Ok(())
}

/// Handle the 'build' command
fn handle_build(encoder: &HashingEncoder, catalog: &PathBuf, index_path: &PathBuf) -> Result<()> {
    println!("Loading catalog from {}...", catalog.display());
    let start = Instant::now();
    let assessments = load_catalog(catalog).context("Failed to load assessment catalog")?;
    println!(
        "{} Loaded {} assessments in {:?}",
        "✓".green(),
        assessments.len(),
        start.elapsed()
    );

    let start = Instant::now();
    let index = EmbeddingIndex::build(encoder, assessments).context("Failed to build index")?;
    index
        .save(index_path)
        .with_context(|| format!("Failed to save index to {}", index_path.display()))?;
    println!(
        "{} Built and saved index ({} vectors, dim {}) in {:?}",
        "✓".green(),
        index.len(),
        index.dimension(),
        start.elapsed()
    );
    Ok(())
}

/// Handle the 'recommend' command
async fn handle_recommend(
    encoder: HashingEncoder,
    catalog: &PathBuf,
    index_path: &PathBuf,
    query: &str,
    k: usize,
    no_rerank: bool,
) -> Result<()> {
    let index = load_or_build_index(&encoder, catalog, index_path)?;

    let reranker = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let client = GeminiClient::new(key, "gemini-2.0-flash")?;
            Some(LlmReranker::new(Arc::new(client)))
        }
        _ => {
            if !no_rerank {
                warn!("GEMINI_API_KEY not set, skipping LLM rerank");
            }
            None
        }
    };

    let encoder: Arc<dyn TextEncoder> = Arc::new(encoder);
    let orchestrator = RecommendationOrchestrator::new(encoder, index, reranker);

    let start = Instant::now();
    let recommendations = orchestrator.recommend(query, k, !no_rerank).await?;
    println!(
        "{} {} recommendations in {:?}\n",
        "✓".green(),
        recommendations.len(),
        start.elapsed()
    );

    print_recommendations(&recommendations);
    Ok(())
}

/// Handle the 'search' command
fn handle_search(
    encoder: &HashingEncoder,
    catalog: &PathBuf,
    index_path: &PathBuf,
    query: &str,
    n: usize,
) -> Result<()> {
    let index = load_or_build_index(encoder, catalog, index_path)?;
    let vector = encoder.encode(query)?;
    let candidates = index.search(&vector, n)?;

    println!("{}", format!("Top {} matches:", candidates.len()).bold().blue());
    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "{:2}. {} {}",
            i + 1,
            format!("[{:.4}]", candidate.score).cyan(),
            candidate.assessment.name
        );
    }
    Ok(())
}

fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        println!("{}", "No recommendations found.".yellow());
        return;
    }

    for rec in recommendations {
        let a = &rec.assessment;
        println!(
            "{:2}. {} {}",
            rec.rank,
            a.name.bold(),
            format!("(score: {:.3})", rec.score).cyan()
        );
        println!(
            "    {} | {} min | adaptive: {} | remote: {}",
            a.test_type.category_name().green(),
            a.duration_minutes,
            if a.adaptive_support { "yes" } else { "no" },
            if a.remote_support { "yes" } else { "no" }
        );
        println!("    {}", a.url.dimmed());
    }
}

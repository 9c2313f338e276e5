//! # Recommendation Orchestrator
//!
//! This module coordinates the entire recommendation pipeline:
//! 1. Validate the query and clamp the requested result count
//! 2. Encode the query and retrieve `3k` candidates from the index
//! 3. Rebalance candidates across categories (DiversityReranker)
//! 4. Optionally refine through the LLM (bounded by a timeout)
//! 5. Assign final rank numbers
//!
//! Failure policy: invalid input is the only error surfaced as rejected
//! input. An unbuilt index or empty corpus yields an empty list. LLM
//! failures of any kind fall back to the diversity ordering. Only an
//! embedding or search failure, below which no fallback exists, is a
//! hard error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use thiserror::Error;
use tracing::{info, warn};

use catalog::Assessment;
use embedding::{Candidate, EmbeddingIndex, TextEncoder};
use rerank::{DiversityReranker, LlmReranker, OVERFETCH_FACTOR};

/// Smallest result count a request may ask for.
pub const MIN_RESULTS: usize = 5;
/// Largest result count a request may ask for.
pub const MAX_RESULTS: usize = 10;

/// Upper bound on the LLM rerank call. Rerank failures are swallowed,
/// so without this the request could block indefinitely.
pub const DEFAULT_RERANK_TIMEOUT: Duration = Duration::from_secs(30);

/// Final recommendation returned to the caller.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub assessment: Assessment,
    pub score: f32,
    /// 1-based position in the final output order.
    pub rank: usize,
}

/// Errors surfaced by [`RecommendationOrchestrator::recommend`].
#[derive(Error, Debug)]
pub enum RecommendError {
    /// Query rejected before any computation.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Embedding or search failed; there is no fallback below retrieval.
    #[error("retrieval failed: {0}")]
    Retrieval(#[source] anyhow::Error),
}

/// Main orchestrator that coordinates the recommendation pipeline.
///
/// Constructed once at startup with its dependencies injected and shared
/// read-only across requests. The index is immutable; a rebuild produces
/// a new index and a new orchestrator is swapped in for readers.
pub struct RecommendationOrchestrator {
    encoder: Arc<dyn TextEncoder>,
    index: Option<Arc<EmbeddingIndex>>,
    diversity: DiversityReranker,
    reranker: Option<LlmReranker>,
    rerank_timeout: Duration,
}

impl RecommendationOrchestrator {
    /// Create an orchestrator over a built index.
    ///
    /// `reranker` is `None` when no generative-language service is
    /// configured; the pipeline then stops after the diversity stage.
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        index: Arc<EmbeddingIndex>,
        reranker: Option<LlmReranker>,
    ) -> Self {
        Self {
            encoder,
            index: Some(index),
            diversity: DiversityReranker::new(),
            reranker,
            rerank_timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    /// Degraded mode for when index construction failed at startup: the
    /// process stays up and `recommend` returns empty lists until an
    /// index is available.
    pub fn degraded(encoder: Arc<dyn TextEncoder>) -> Self {
        warn!("Orchestrator running degraded: no index, recommendations will be empty");
        Self {
            encoder,
            index: None,
            diversity: DiversityReranker::new(),
            reranker: None,
            rerank_timeout: DEFAULT_RERANK_TIMEOUT,
        }
    }

    pub fn with_rerank_timeout(mut self, timeout: Duration) -> Self {
        self.rerank_timeout = timeout;
        self
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn has_reranker(&self) -> bool {
        self.reranker.is_some()
    }

    /// Main entry point: recommend at most `k` assessments for `query`.
    ///
    /// `k` is clamped to `[MIN_RESULTS, MAX_RESULTS]`. With
    /// `use_rerank = false` the output is fully deterministic for a
    /// fixed index.
    pub async fn recommend(
        &self,
        query: &str,
        k: usize,
        use_rerank: bool,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let start_time = Instant::now();

        let trimmed = query.trim();
        if trimmed.chars().count() < 3 {
            return Err(RecommendError::InvalidQuery(
                "query must be at least 3 characters".to_string(),
            ));
        }

        let k = k.clamp(MIN_RESULTS, MAX_RESULTS);

        let Some(index) = &self.index else {
            warn!("No index available, returning empty recommendations");
            return Ok(Vec::new());
        };

        let candidates = self.retrieve(Arc::clone(index), query, k * OVERFETCH_FACTOR).await?;
        if candidates.is_empty() {
            info!("No candidates for query, returning empty recommendations");
            return Ok(Vec::new());
        }
        info!("Retrieved {} candidates", candidates.len());

        let balanced = self.diversity.rebalance(candidates, k, query);
        info!("Diversity stage kept {} candidates", balanced.len());

        let ranked = if use_rerank {
            self.apply_rerank(query, balanced, k).await
        } else {
            balanced
        };

        let mut recommendations: Vec<Recommendation> = ranked
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, Candidate { assessment, score })| Recommendation {
                assessment,
                score,
                rank: i + 1,
            })
            .collect();
        recommendations.truncate(k);

        info!(
            "Returning {} recommendations in {:.2?}",
            recommendations.len(),
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Encode the query and search the index on a blocking thread.
    async fn retrieve(
        &self,
        index: Arc<EmbeddingIndex>,
        query: &str,
        n: usize,
    ) -> Result<Vec<Candidate>, RecommendError> {
        let encoder = Arc::clone(&self.encoder);
        let query = query.to_string();

        let result = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<Candidate>> {
            let vector = encoder.encode(&query)?;
            Ok(index.search(&vector, n)?)
        })
        .await
        .map_err(|e| RecommendError::Retrieval(anyhow!("retrieval task panicked: {e}")))?;

        result.map_err(RecommendError::Retrieval)
    }

    /// Run the LLM stage under the configured timeout. Any failure keeps
    /// the diversity ordering.
    async fn apply_rerank(&self, query: &str, balanced: Vec<Candidate>, k: usize) -> Vec<Candidate> {
        let Some(reranker) = &self.reranker else {
            return balanced;
        };

        match tokio::time::timeout(self.rerank_timeout, reranker.rerank(query, &balanced, k)).await
        {
            Ok(reranked) => reranked,
            Err(_) => {
                warn!(
                    "LLM rerank timed out after {:?}, keeping diversity order",
                    self.rerank_timeout
                );
                balanced
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog::TestType;
    use embedding::HashingEncoder;
    use llm_client::{CompletionError, CompletionService};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn assessment(name: &str, url: &str, test_type: TestType) -> Assessment {
        Assessment {
            name: name.to_string(),
            url: url.to_string(),
            description: format!("{name} description"),
            category: test_type.category_name().to_string(),
            test_type,
            duration_minutes: 20,
            adaptive_support: false,
            remote_support: true,
        }
    }

    fn test_corpus() -> Vec<Assessment> {
        let mut corpus = Vec::new();
        for (i, tt) in [
            TestType::Knowledge,
            TestType::Personality,
            TestType::Cognitive,
            TestType::Situational,
        ]
        .iter()
        .enumerate()
        {
            for j in 0..5 {
                corpus.push(assessment(
                    &format!("{} Assessment {j}", tt.category_name()),
                    &format!("https://example.com/{i}/{j}"),
                    *tt,
                ));
            }
        }
        corpus
    }

    fn build_orchestrator(reranker: Option<LlmReranker>) -> RecommendationOrchestrator {
        let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::default());
        let index = Arc::new(
            EmbeddingIndex::build(encoder.as_ref(), test_corpus()).expect("index build"),
        );
        RecommendationOrchestrator::new(encoder, index, reranker)
    }

    /// Completion stub: fixed response or guaranteed failure.
    struct StubCompletion {
        response: Option<String>,
    }

    #[async_trait]
    impl CompletionService for StubCompletion {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            self.response.clone().ok_or(CompletionError::EmptyResponse)
        }

        fn model_id(&self) -> &str {
            "stub"
        }
    }

    fn failing_reranker() -> LlmReranker {
        LlmReranker::new(Arc::new(StubCompletion { response: None }))
    }

    // ============================================================================
    // Validation and clamping
    // ============================================================================

    #[tokio::test]
    async fn rejects_empty_query() {
        let orchestrator = build_orchestrator(None);
        let err = orchestrator.recommend("", 10, false).await.unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn rejects_short_query_after_trimming() {
        let orchestrator = build_orchestrator(None);
        let err = orchestrator.recommend("  ab  ", 10, false).await.unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn clamps_k_into_valid_range() {
        let orchestrator = build_orchestrator(None);

        // k below minimum is raised to 5
        let low = orchestrator
            .recommend("numerical reasoning", 1, false)
            .await
            .unwrap();
        assert!(low.len() <= MIN_RESULTS);
        assert!(!low.is_empty());

        // k above maximum is capped at 10
        let high = orchestrator
            .recommend("numerical reasoning", 100, false)
            .await
            .unwrap();
        assert!(high.len() <= MAX_RESULTS);
    }

    #[tokio::test]
    async fn output_never_exceeds_k() {
        let orchestrator = build_orchestrator(None);
        for k in MIN_RESULTS..=MAX_RESULTS {
            let recs = orchestrator
                .recommend("knowledge assessment", k, false)
                .await
                .unwrap();
            assert!(recs.len() <= k, "k={k} returned {}", recs.len());
        }
    }

    // ============================================================================
    // Pipeline behavior
    // ============================================================================

    #[tokio::test]
    async fn assigns_one_based_ranks_in_order() {
        let orchestrator = build_orchestrator(None);
        let recs = orchestrator
            .recommend("cognitive assessment", 10, false)
            .await
            .unwrap();

        assert!(!recs.is_empty());
        for (i, rec) in recs.iter().enumerate() {
            assert_eq!(rec.rank, i + 1);
        }
    }

    #[tokio::test]
    async fn repeated_calls_are_deterministic_without_rerank() {
        let orchestrator = build_orchestrator(None);
        let query = "Java developer with good communication and teamwork";

        let first = orchestrator.recommend(query, 10, false).await.unwrap();
        for _ in 0..3 {
            let again = orchestrator.recommend(query, 10, false).await.unwrap();
            assert_eq!(again.len(), first.len());
            for (a, b) in first.iter().zip(&again) {
                assert_eq!(a.assessment.url, b.assessment.url);
                assert_eq!(a.score.to_bits(), b.score.to_bits());
                assert_eq!(a.rank, b.rank);
            }
        }
    }

    #[tokio::test]
    async fn empty_corpus_returns_empty_list() {
        let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::default());
        let index = Arc::new(EmbeddingIndex::build(encoder.as_ref(), vec![]).unwrap());
        let orchestrator = RecommendationOrchestrator::new(encoder, index, None);

        let recs = orchestrator.recommend("any query", 10, true).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn degraded_orchestrator_returns_empty_not_error() {
        let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::default());
        let orchestrator = RecommendationOrchestrator::degraded(encoder);
        assert!(!orchestrator.has_index());

        let recs = orchestrator.recommend("valid query", 10, true).await.unwrap();
        assert!(recs.is_empty());
    }

    // ============================================================================
    // Rerank fallback
    // ============================================================================

    #[tokio::test]
    async fn failing_llm_matches_diversity_only_output() {
        let with_failing_llm = build_orchestrator(Some(failing_reranker()));
        let without_llm = build_orchestrator(None);
        let query = "Java developer with good communication and teamwork";

        let fallback = with_failing_llm.recommend(query, 10, true).await.unwrap();
        let baseline = without_llm.recommend(query, 10, false).await.unwrap();

        assert_eq!(fallback.len(), baseline.len());
        for (a, b) in fallback.iter().zip(&baseline) {
            assert_eq!(a.assessment.url, b.assessment.url);
            assert_eq!(a.rank, b.rank);
        }
    }

    #[tokio::test]
    async fn use_rerank_false_skips_configured_reranker() {
        let orchestrator = build_orchestrator(Some(failing_reranker()));
        assert!(orchestrator.has_reranker());

        // Must not even consult the (failing) service
        let recs = orchestrator
            .recommend("personality questionnaire", 10, false)
            .await
            .unwrap();
        assert!(!recs.is_empty());
    }

    #[tokio::test]
    async fn slow_llm_is_cut_off_by_timeout() {
        struct SlowCompletion;

        #[async_trait]
        impl CompletionService for SlowCompletion {
            async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(String::new())
            }

            fn model_id(&self) -> &str {
                "slow"
            }
        }

        let encoder: Arc<dyn TextEncoder> = Arc::new(HashingEncoder::default());
        let index = Arc::new(EmbeddingIndex::build(encoder.as_ref(), test_corpus()).unwrap());
        let orchestrator = RecommendationOrchestrator::new(
            encoder,
            index,
            Some(LlmReranker::new(Arc::new(SlowCompletion))),
        )
        .with_rerank_timeout(Duration::from_millis(50));

        let start = Instant::now();
        let recs = orchestrator
            .recommend("knowledge assessment", 10, true)
            .await
            .unwrap();
        assert!(!recs.is_empty());
        assert!(
            start.elapsed() < Duration::from_secs(5),
            "timeout did not bound the rerank call"
        );
    }
}

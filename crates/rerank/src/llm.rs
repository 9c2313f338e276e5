//! LLM-assisted refinement of the diversity-ranked candidate list.
//!
//! The model receives the query and a numbered rendering of each
//! candidate and replies with free-form text. The reply is used purely
//! as a filter: candidates are kept in their original order when their
//! display name occurs as a literal substring of the response. If the
//! call fails, times out upstream, or matches fewer than `k` names, the
//! pre-rerank ordering is returned untouched. Nothing here is ever
//! surfaced to the caller as an error.

use std::sync::Arc;

use embedding::Candidate;
use llm_client::CompletionService;
use tracing::{debug, warn};

/// Fixed instruction template. `{query}` and `{candidates}` are filled
/// in by [`LlmReranker::render_prompt`].
const PROMPT_TEMPLATE: &str = "\
You are an expert HR assessment consultant.

Given a job requirement or query, analyze what skills and competencies are \
needed and recommend the most relevant assessments.

Query: {query}

Retrieved Assessments (from vector search):
{candidates}

Your task:
1. Analyze the query to identify required skills (technical, cognitive, personality, behavioral)
2. Review the retrieved assessments and their relevance
3. Select the most relevant assessments
4. Ensure a balanced mix if the query requires multiple skill types
5. Rank them by relevance

Provide your recommendations as a numbered list with brief justification for each.

Recommendations:";

/// Optional rerank stage backed by a completion service.
pub struct LlmReranker {
    completion: Arc<dyn CompletionService>,
}

impl LlmReranker {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    pub fn model_id(&self) -> &str {
        self.completion.model_id()
    }

    /// Render the instruction prompt for `query` over `candidates`.
    fn render_prompt(query: &str, candidates: &[Candidate]) -> String {
        let mut rendered = String::new();
        for (i, candidate) in candidates.iter().enumerate() {
            rendered.push_str(&format!(
                "{}. {}\n   Description: {}\n   Type: {}\n   Relevance Score: {:.3}\n\n",
                i + 1,
                candidate.assessment.name,
                candidate.assessment.description,
                candidate.assessment.test_type.display_name(),
                candidate.score,
            ));
        }

        PROMPT_TEMPLATE
            .replace("{query}", query)
            .replace("{candidates}", &rendered)
    }

    /// Refine `candidates` (size <= k) via the completion service.
    ///
    /// Returns the filtered list, or the unmodified input truncated to
    /// `k` on any failure or under-fill.
    pub async fn rerank(&self, query: &str, candidates: &[Candidate], k: usize) -> Vec<Candidate> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let fallback = || candidates.iter().take(k).cloned().collect::<Vec<_>>();

        let prompt = Self::render_prompt(query, candidates);
        let response = match self.completion.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM rerank failed, keeping retrieval order: {e}");
                return fallback();
            }
        };

        // The response acts as a filter over the original order: a name
        // mentioned anywhere in the text keeps its candidate. The model's
        // own ordering is intentionally ignored.
        let kept: Vec<Candidate> = candidates
            .iter()
            .filter(|c| response.contains(&c.assessment.name))
            .cloned()
            .collect();

        if kept.len() < k {
            warn!(
                "LLM response matched {} of {} candidates (k={}), keeping retrieval order",
                kept.len(),
                candidates.len(),
                k
            );
            return fallback();
        }

        debug!("LLM rerank kept {} candidates", kept.len());
        let mut kept = kept;
        kept.truncate(k);
        kept
    }
}

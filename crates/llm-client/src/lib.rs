//! Completion client for the generative-language service.
//!
//! This crate provides the boundary to the optional LLM used for
//! reranking: a single prompt in, free-form text out, no session state.
//! The [`CompletionService`] trait is the seam the rerank layer depends
//! on; [`GeminiClient`] is the production implementation against the
//! Gemini `generateContent` REST API.
//!
//! Failures here are always recoverable upstream: callers fall back to
//! the pre-rerank ordering, so errors carry diagnostics rather than
//! anything a user would see.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Gemini REST endpoint base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Low temperature: the rerank prompt wants consistent selections, not
/// creative writing.
const TEMPERATURE: f32 = 0.2;

/// Errors from the completion service.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("completion response contained no text")]
    EmptyResponse,
}

/// Single prompt-in / free-text-out completion call.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one prompt and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Model identifier, for logging.
    fn model_id(&self) -> &str;
}

// =============================================================================
// Gemini wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate's parts.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

// =============================================================================
// Gemini client
// =============================================================================

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for the given API key and model.
    ///
    /// The built-in request timeout is a backstop; the orchestrator
    /// enforces its own tighter deadline around the rerank call.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Override the endpoint base, for tests against a local stub.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        debug!("Sending completion request to model {}", self.model);

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Completion API error {}: {}", status, message);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_text().ok_or(CompletionError::EmptyResponse)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

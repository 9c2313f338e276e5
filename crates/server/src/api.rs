//! HTTP API (axum) for the recommendation service.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness probe, always `{"status": "healthy"}`
//! - `POST /recommend`: body `{"query": "...", "k": 10}` (`k` optional),
//!   responds `{"recommended_assessments": [...]}`
//!
//! ## Error shape
//!
//! Rejected input is HTTP 400, retrieval failure HTTP 500, both as
//! `{"error": "...", "status": "error"}`.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::orchestrator::{MAX_RESULTS, RecommendError, Recommendation, RecommendationOrchestrator};

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RecommendationOrchestrator>,
}

pub fn create_router(orchestrator: Arc<RecommendationOrchestrator>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/recommend", post(recommend_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { orchestrator })
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub query: String,
    /// Result count; clamped server-side, defaults to the maximum.
    pub k: Option<usize>,
    /// Skip the LLM refinement stage even when one is configured.
    #[serde(default)]
    pub skip_rerank: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommended_assessments: Vec<AssessmentItem>,
}

/// One recommendation in the wire format clients consume.
#[derive(Debug, Serialize)]
pub struct AssessmentItem {
    pub url: String,
    pub name: String,
    pub adaptive_support: &'static str,
    pub description: String,
    pub duration: u32,
    pub remote_support: &'static str,
    pub test_type: Vec<&'static str>,
}

impl From<&Recommendation> for AssessmentItem {
    fn from(rec: &Recommendation) -> Self {
        let a = &rec.assessment;
        Self {
            url: a.url.clone(),
            name: a.name.clone(),
            adaptive_support: if a.adaptive_support { "Yes" } else { "No" },
            description: a.description.clone(),
            duration: a.duration_minutes,
            remote_support: if a.remote_support { "Yes" } else { "No" },
            test_type: vec![a.test_type.display_name()],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status: &'static str,
}

/// HTTP mapping of orchestrator errors, plus request-shape problems the
/// orchestrator never sees.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::InvalidQuery(msg) => ApiError::BadRequest(msg),
            RecommendError::Retrieval(e) => {
                error!("Retrieval failed: {e:#}");
                ApiError::Internal("recommendation pipeline failed".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (
            status,
            Json(ErrorResponse {
                error: message,
                status: "error",
            }),
        )
            .into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    request: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    // Malformed or incomplete bodies get the same 400 envelope as an
    // invalid query, not the extractor's default response
    let Json(request) = request.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let k = request.k.unwrap_or(MAX_RESULTS);
    info!(
        "Recommend request: k={k}, skip_rerank={}, query_len={}",
        request.skip_rerank,
        request.query.len()
    );

    let recommendations = state
        .orchestrator
        .recommend(&request.query, k, !request.skip_rerank)
        .await?;

    Ok(Json(RecommendResponse {
        recommended_assessments: recommendations.iter().map(AssessmentItem::from).collect(),
    }))
}

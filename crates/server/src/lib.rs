//! Server crate for the assessment recommendation engine.
//!
//! Contains the orchestrator that coordinates the recommendation
//! pipeline, the HTTP API on top of it, and the startup bootstrap that
//! loads or rebuilds the embedding index.

pub mod api;
pub mod bootstrap;
pub mod orchestrator;

pub use api::create_router;
pub use bootstrap::load_or_build_index;
pub use orchestrator::{
    DEFAULT_RERANK_TIMEOUT, MAX_RESULTS, MIN_RESULTS, RecommendError, Recommendation,
    RecommendationOrchestrator,
};

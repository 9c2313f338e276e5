//! # Rerank Crate
//!
//! Reranking stages applied to the over-fetched candidate set from the
//! embedding index.
//!
//! ## Components
//!
//! ### DiversityReranker
//! Quota-based rebalancing across test-type categories when the query
//! signals that multiple skill types matter (e.g. "Java developer with
//! good communication"). Pure and synchronous.
//!
//! ### LlmReranker (optional)
//! Refines the diversity-ranked list through a single completion call,
//! treating the response as a name filter over the original order.
//! Degrades to a no-op on any failure; the caller bounds it with a
//! timeout.

// Public modules
pub mod diversity;
pub mod llm;

// Re-export commonly used types
pub use diversity::{BALANCE_TRIGGERS, DiversityReranker, OVERFETCH_FACTOR};
pub use llm::LlmReranker;

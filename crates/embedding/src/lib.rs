//! # Embedding Crate
//!
//! Retrieval layer: turns a query string into a ranked list of
//! (assessment, score) candidates.
//!
//! ## Main Components
//!
//! - **encoder**: TextEncoder trait and the deterministic HashingEncoder
//! - **index**: flat inner-product EmbeddingIndex and Candidate
//! - **store**: atomic save/load of the index artifact
//!
//! ## Example Usage
//!
//! ```ignore
//! use embedding::{EmbeddingIndex, HashingEncoder, TextEncoder};
//!
//! let encoder = HashingEncoder::default();
//! let index = EmbeddingIndex::build(&encoder, assessments)?;
//!
//! let query = encoder.encode("java developer with teamwork skills")?;
//! let candidates = index.search(&query, 30)?;
//! ```

// Public modules
pub mod encoder;
pub mod index;
pub mod store;

// Re-export commonly used types
pub use encoder::{DEFAULT_DIMENSION, EncodeError, HashingEncoder, TextEncoder};
pub use index::{Candidate, EmbeddingIndex, IndexError};
pub use store::StoreError;

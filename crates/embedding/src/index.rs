//! Flat inner-product vector index over the assessment corpus.
//!
//! The index is built once from a catalog snapshot and is immutable
//! afterwards, so it can be shared read-only (`Arc`) across concurrent
//! requests. A rebuild produces a complete new index that the owner swaps
//! in; there is no in-place mutation.

use catalog::Assessment;
use thiserror::Error;
use tracing::info;

use crate::encoder::{EncodeError, TextEncoder};

/// Transient pairing of an assessment and a similarity score, valid for
/// one request.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub assessment: Assessment,
    /// Cosine similarity in [-1, 1] (inner product of normalized vectors).
    pub score: f32,
}

impl Candidate {
    pub fn new(assessment: Assessment, score: f32) -> Self {
        Self { assessment, score }
    }
}

/// Errors from index construction and search.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Immutable vector index: one normalized embedding per assessment, in
/// corpus insertion order.
#[derive(Debug)]
pub struct EmbeddingIndex {
    assessments: Vec<Assessment>,
    vectors: Vec<Vec<f32>>,
    dimension: usize,
    model_id: String,
}

impl EmbeddingIndex {
    /// Embed every assessment and build the index.
    ///
    /// The corpus order of `catalog` is preserved; it is the tie-break
    /// order for equal scores in [`EmbeddingIndex::search`].
    pub fn build(encoder: &dyn TextEncoder, catalog: Vec<Assessment>) -> Result<Self, IndexError> {
        let texts: Vec<String> = catalog.iter().map(|a| a.embedding_text()).collect();
        let vectors = encoder.encode_batch(&texts)?;

        info!(
            "Built embedding index: {} vectors, dimension {}, model {}",
            vectors.len(),
            encoder.dimension(),
            encoder.model_id()
        );

        Ok(Self {
            assessments: catalog,
            vectors,
            dimension: encoder.dimension(),
            model_id: encoder.model_id().to_string(),
        })
    }

    /// Reassemble an index from persisted parts, revalidating the shape.
    /// Used by the artifact loader; `reason` strings feed its corruption
    /// reporting.
    pub(crate) fn from_parts(
        assessments: Vec<Assessment>,
        vectors: Vec<Vec<f32>>,
        dimension: usize,
        model_id: String,
    ) -> Result<Self, String> {
        if vectors.len() != assessments.len() {
            return Err(format!(
                "vector count {} does not match assessment count {}",
                vectors.len(),
                assessments.len()
            ));
        }
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(format!(
                "vector {} has dimension {}, expected {}",
                bad,
                vectors[bad].len(),
                dimension
            ));
        }
        Ok(Self {
            assessments,
            vectors,
            dimension,
            model_id,
        })
    }

    pub fn len(&self) -> usize {
        self.assessments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assessments.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub(crate) fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    /// Return the `n` assessments with the highest inner-product score
    /// against `query`, descending. Ties are broken by corpus insertion
    /// order so repeated searches are deterministic.
    pub fn search(&self, query: &[f32], n: usize) -> Result<Vec<Candidate>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| dot(query, v))
            .enumerate()
            .collect();

        // Score descending, insertion order ascending on ties
        scored.sort_unstable_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);

        Ok(scored
            .into_iter()
            .map(|(i, score)| Candidate::new(self.assessments[i].clone(), score))
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

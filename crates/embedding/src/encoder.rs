//! Text encoding: opaque text → normalized fixed-dimension vector.
//!
//! The pipeline never looks inside a vector; it only requires that
//! encoding is deterministic, fixed-dimension and L2-normalized so that
//! inner product equals cosine similarity. [`TextEncoder`] is the seam
//! where a real sentence-embedding model (local or remote) plugs in;
//! [`HashingEncoder`] is the self-contained default backend.

use rayon::prelude::*;
use thiserror::Error;

/// Default embedding dimension, matching the all-MiniLM-L6-v2 family
/// the corpus was originally embedded with.
pub const DEFAULT_DIMENSION: usize = 384;

/// Errors that can occur while encoding text.
///
/// The local hashing backend is infallible; this exists for remote
/// encoder implementations, where a failure here means retrieval is
/// impossible and must surface as a hard error.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("embedding backend failure: {0}")]
    Backend(String),
}

/// An opaque text-embedding function.
///
/// Contract:
/// - `encode` is deterministic for a fixed `model_id`
/// - output length is always `dimension()`
/// - output is L2-normalized (or all-zero for contentless input)
pub trait TextEncoder: Send + Sync {
    /// Fixed output dimension D.
    fn dimension(&self) -> usize;

    /// Identifier persisted with index artifacts; a mismatch on load
    /// means the vectors were produced by a different encoder.
    fn model_id(&self) -> &str;

    /// Encode a single text into a normalized vector of length D.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncodeError>;

    /// Encode a batch of texts (corpus build). Default is sequential;
    /// implementations may parallelize or batch remote calls.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        texts.iter().map(|t| self.encode(t)).collect()
    }
}

/// Deterministic local encoder using the hashing trick.
///
/// Unigrams and word bigrams are hashed (FNV-1a) into a fixed number of
/// signed buckets and the result is L2-normalized. No model weights, no
/// network: the same text always maps to the same vector, which is what
/// the persistence round-trip and determinism guarantees rely on.
pub struct HashingEncoder {
    dimension: usize,
    model_id: String,
}

/// Bigrams carry less weight than unigrams so that exact term matches
/// dominate phrase matches.
const BIGRAM_WEIGHT: f32 = 0.5;

impl HashingEncoder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("hashing-fnv1a-{dimension}"),
        }
    }

    fn accumulate(&self, vector: &mut [f32], token: &str, weight: f32) {
        let hash = fnv1a_64(token.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        // Top bit picks the sign, decorrelating bucket collisions
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl TextEncoder for HashingEncoder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, EncodeError> {
        let mut vector = vec![0.0f32; self.dimension];

        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        for token in &tokens {
            self.accumulate(&mut vector, token, 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.accumulate(&mut vector, &bigram, BIGRAM_WEIGHT);
        }

        normalize(&mut vector);
        Ok(vector)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncodeError> {
        texts.par_iter().map(|t| self.encode(t)).collect()
    }
}

/// L2-normalize in place. A zero vector stays zero.
fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// 64-bit FNV-1a. Stable across platforms and releases, unlike
/// `DefaultHasher`, which the persisted vectors depend on.
fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_deterministic() {
        let encoder = HashingEncoder::default();
        let a = encoder.encode("Java developer with good communication").unwrap();
        let b = encoder.encode("Java developer with good communication").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn encode_has_fixed_dimension() {
        let encoder = HashingEncoder::new(128);
        let vector = encoder.encode("short").unwrap();
        assert_eq!(vector.len(), 128);
        assert_eq!(encoder.dimension(), 128);
    }

    #[test]
    fn encode_is_normalized() {
        let encoder = HashingEncoder::default();
        let vector = encoder
            .encode("numerical reasoning assessment for analysts")
            .unwrap();
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let encoder = HashingEncoder::default();
        let vector = encoder.encode("  ,, ").unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn similar_texts_score_higher_than_unrelated() {
        let encoder = HashingEncoder::default();
        let query = encoder.encode("java programming test").unwrap();
        let related = encoder.encode("java programming skills assessment").unwrap();
        let unrelated = encoder.encode("sales personality questionnaire").unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn batch_matches_single_encoding() {
        let encoder = HashingEncoder::default();
        let texts = vec!["one two".to_string(), "three four".to_string()];
        let batch = encoder.encode_batch(&texts).unwrap();
        assert_eq!(batch[0], encoder.encode("one two").unwrap());
        assert_eq!(batch[1], encoder.encode("three four").unwrap());
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        // Reference values for the 64-bit FNV-1a test suite
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}

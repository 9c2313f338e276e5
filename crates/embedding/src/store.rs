//! Index persistence: save/load of the embedding artifact.
//!
//! The vectors, the assessment snapshot, the dimension and the encoder
//! model id are written as one JSON artifact so a load either reproduces
//! the exact index or fails as a unit. Saves go through a temp file and
//! rename, so readers never observe a partial artifact.
//!
//! Load failures distinguish "not yet built" (no artifact on disk) from
//! "corrupt" (present but unreadable or structurally invalid); both are
//! recoverable by rebuilding from the catalog.

use std::path::{Path, PathBuf};

use catalog::Assessment;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::index::EmbeddingIndex;

/// Errors from the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No artifact on disk; the index has never been saved here.
    #[error("no index artifact at {path}")]
    NotBuilt { path: PathBuf },

    /// Artifact exists but is unreadable or structurally invalid.
    #[error("index artifact is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk representation. One unit: all fields round-trip together.
#[derive(Serialize, Deserialize)]
struct IndexArtifact {
    model_id: String,
    dimension: usize,
    assessments: Vec<Assessment>,
    vectors: Vec<Vec<f32>>,
}

impl EmbeddingIndex {
    /// Persist this index atomically to `path`.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let artifact = IndexArtifact {
            model_id: self.model_id().to_string(),
            dimension: self.dimension(),
            assessments: self.assessments().to_vec(),
            vectors: self.vectors().to_vec(),
        };

        // serde_json emits shortest round-trip float representations, so
        // a save/load cycle reproduces bit-identical vectors
        let bytes = serde_json::to_vec(&artifact)
            .map_err(|e| StoreError::Corrupt {
                reason: format!("serialization failed: {e}"),
            })?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "index.json".to_string());
        let tmp = path.with_file_name(format!("{file_name}.tmp"));

        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, path)?;

        info!(
            "Saved index artifact ({} vectors) to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a previously saved index from `path`.
    ///
    /// Returns [`StoreError::NotBuilt`] when the artifact is missing and
    /// [`StoreError::Corrupt`] when it cannot be parsed or its shape is
    /// inconsistent. Callers are expected to rebuild from the catalog in
    /// either case.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotBuilt {
                    path: path.to_path_buf(),
                }
            } else {
                StoreError::Io(e)
            }
        })?;

        let artifact: IndexArtifact =
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupt {
                reason: e.to_string(),
            })?;

        let index = EmbeddingIndex::from_parts(
            artifact.assessments,
            artifact.vectors,
            artifact.dimension,
            artifact.model_id,
        )
        .map_err(|reason| StoreError::Corrupt { reason })?;

        info!(
            "Loaded index artifact ({} vectors, model {}) from {}",
            index.len(),
            index.model_id(),
            path.display()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{HashingEncoder, TextEncoder};
    use catalog::TestType;

    fn assessment(name: &str, url: &str) -> Assessment {
        Assessment {
            name: name.to_string(),
            url: url.to_string(),
            description: "desc".to_string(),
            category: "Knowledge & Skills".to_string(),
            test_type: TestType::Knowledge,
            duration_minutes: 15,
            adaptive_support: true,
            remote_support: true,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("embedding-store-{}-{name}", std::process::id()))
    }

    #[test]
    fn round_trip_reproduces_identical_search_results() {
        let encoder = HashingEncoder::default();
        let corpus = vec![
            assessment("Java Test", "https://x/1"),
            assessment("Python Test", "https://x/2"),
            assessment("SQL Test", "https://x/3"),
        ];
        let index = EmbeddingIndex::build(&encoder, corpus).unwrap();

        let path = temp_path("roundtrip.json");
        index.save(&path).unwrap();
        let reloaded = EmbeddingIndex::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(reloaded.len(), index.len());
        assert_eq!(reloaded.model_id(), index.model_id());

        let query = encoder.encode("python developer").unwrap();
        let before = index.search(&query, 3).unwrap();
        let after = reloaded.search(&query, 3).unwrap();

        assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(&after) {
            assert_eq!(a.assessment.url, b.assessment.url);
            // Bit-identical, not approximately equal
            assert_eq!(a.score.to_bits(), b.score.to_bits());
        }
    }

    #[test]
    fn load_missing_artifact_is_not_built() {
        let err = EmbeddingIndex::load(Path::new("/nonexistent/index.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotBuilt { .. }));
    }

    #[test]
    fn load_unparseable_artifact_is_corrupt() {
        let path = temp_path("garbage.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = EmbeddingIndex::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn load_rejects_inconsistent_shapes() {
        // One assessment but zero vectors
        let artifact = serde_json::json!({
            "model_id": "hashing-fnv1a-384",
            "dimension": 384,
            "assessments": [serde_json::to_value(assessment("A", "https://x/1")).unwrap()],
            "vectors": [],
        });
        let path = temp_path("shape.json");
        std::fs::write(&path, serde_json::to_vec(&artifact).unwrap()).unwrap();

        let err = EmbeddingIndex::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}

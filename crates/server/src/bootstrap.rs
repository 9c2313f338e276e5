//! Startup wiring: load the persisted index or rebuild it from the
//! catalog snapshot.
//!
//! Load failures are never fatal on their own. A missing artifact means
//! "not yet built" and a corrupt one means "rebuild"; only when the
//! rebuild itself fails does the error propagate (and even then the
//! caller may choose a degraded orchestrator over exiting).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use catalog::load_catalog;
use embedding::{EmbeddingIndex, StoreError, TextEncoder};

/// Load the index artifact at `index_path`, or rebuild it from the
/// catalog at `catalog_path` and save the result.
///
/// A persisted index is only reused when its model id and dimension
/// match `encoder`; vectors from a different encoder would silently
/// produce garbage similarities.
pub fn load_or_build_index(
    encoder: &dyn TextEncoder,
    catalog_path: &Path,
    index_path: &Path,
) -> Result<Arc<EmbeddingIndex>> {
    match EmbeddingIndex::load(index_path) {
        Ok(index) => {
            if index.model_id() == encoder.model_id() && index.dimension() == encoder.dimension() {
                return Ok(Arc::new(index));
            }
            warn!(
                "Index artifact was built with model {} (dim {}), encoder is {} (dim {}); rebuilding",
                index.model_id(),
                index.dimension(),
                encoder.model_id(),
                encoder.dimension()
            );
        }
        Err(StoreError::NotBuilt { path }) => {
            info!("No index artifact at {}, building from catalog", path.display());
        }
        Err(e) => {
            warn!("Failed to load index artifact, rebuilding: {e}");
        }
    }

    let assessments = load_catalog(catalog_path)
        .with_context(|| format!("loading catalog from {}", catalog_path.display()))?;
    let index = EmbeddingIndex::build(encoder, assessments).context("building embedding index")?;

    // Persistence is best-effort here: an unsaved index still serves
    // this process, it just rebuilds again next start
    if let Err(e) = index.save(index_path) {
        warn!("Failed to save index artifact to {}: {e}", index_path.display());
    }

    Ok(Arc::new(index))
}

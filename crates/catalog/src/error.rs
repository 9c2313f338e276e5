//! Error types for catalog loading.

use thiserror::Error;

/// Errors that can occur while loading the catalog snapshot.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be found or opened
    #[error("failed to open catalog file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog JSON could not be parsed
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record failed validation
    #[error("invalid catalog record {url}: {reason}")]
    Validation { url: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;

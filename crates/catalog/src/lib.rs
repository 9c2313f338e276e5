//! # Catalog Crate
//!
//! This crate handles the assessment catalog snapshot.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Assessment, TestType)
//! - **loader**: Parse the scraped catalog JSON into Rust structs
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::load_catalog;
//! use std::path::Path;
//!
//! let assessments = load_catalog(Path::new("data/scraped_data.json"))?;
//! println!("Loaded {} assessments", assessments.len());
//! ```

// Public modules
pub mod error;
pub mod loader;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use loader::{load_catalog, parse_catalog};
pub use types::{Assessment, TestType};

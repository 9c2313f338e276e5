//! Load and validate the catalog snapshot.
//!
//! The catalog is an ordered JSON array of assessment records produced by
//! the scraping pipeline. The core treats it as a read-only snapshot: the
//! file order defines corpus insertion order.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::{CatalogError, Result};
use crate::types::Assessment;

/// Parse a catalog snapshot from a JSON string.
///
/// Validation:
/// - `duration` must be positive
/// - `url` must be unique across the snapshot
///
/// Unknown `test_type` codes are rejected by serde during parsing.
pub fn parse_catalog(json: &str) -> Result<Vec<Assessment>> {
    let assessments: Vec<Assessment> = serde_json::from_str(json)?;

    let mut seen_urls = HashSet::new();
    for assessment in &assessments {
        if assessment.duration_minutes == 0 {
            return Err(CatalogError::Validation {
                url: assessment.url.clone(),
                reason: "duration must be positive".to_string(),
            });
        }
        if !seen_urls.insert(assessment.url.as_str()) {
            return Err(CatalogError::Validation {
                url: assessment.url.clone(),
                reason: "duplicate url".to_string(),
            });
        }
    }

    Ok(assessments)
}

/// Load the catalog snapshot from a JSON file.
pub fn load_catalog(path: &Path) -> Result<Vec<Assessment>> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CatalogError::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            CatalogError::Io(e)
        }
    })?;

    let assessments = parse_catalog(&json)?;
    info!(
        "Loaded {} assessments from {}",
        assessments.len(),
        path.display()
    );
    Ok(assessments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TestType;

    fn record(name: &str, url: &str, test_type: &str, duration: u32) -> String {
        format!(
            r#"{{
                "assessment_name": "{name}",
                "url": "{url}",
                "description": "desc",
                "category": "cat",
                "test_type": "{test_type}",
                "duration": {duration},
                "adaptive_support": "No",
                "remote_support": "Yes"
            }}"#
        )
    }

    #[test]
    fn parses_ordered_catalog() {
        let json = format!(
            "[{},{}]",
            record("A", "https://example.com/a", "K", 10),
            record("B", "https://example.com/b", "P", 20),
        );

        let catalog = parse_catalog(&json).unwrap();
        assert_eq!(catalog.len(), 2);
        // File order is corpus insertion order
        assert_eq!(catalog[0].name, "A");
        assert_eq!(catalog[1].name, "B");
        assert_eq!(catalog[1].test_type, TestType::Personality);
    }

    #[test]
    fn rejects_zero_duration() {
        let json = format!("[{}]", record("A", "https://example.com/a", "C", 0));
        let err = parse_catalog(&json).unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[test]
    fn rejects_duplicate_urls() {
        let json = format!(
            "[{},{}]",
            record("A", "https://example.com/same", "K", 10),
            record("B", "https://example.com/same", "P", 20),
        );
        let err = parse_catalog(&json).unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[test]
    fn rejects_unknown_test_type() {
        let json = format!("[{}]", record("A", "https://example.com/a", "Z", 10));
        assert!(matches!(
            parse_catalog(&json).unwrap_err(),
            CatalogError::Json(_)
        ));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }
}

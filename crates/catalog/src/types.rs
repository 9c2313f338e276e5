//! Core domain types for the assessment catalog.
//!
//! An [`Assessment`] is an immutable catalog record created once during
//! catalog ingestion. The `url` field is the unique key; the ordering of
//! records in the catalog file is the corpus insertion order and is
//! preserved everywhere downstream (it is the tie-break order for search).

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Test Type
// =============================================================================

/// Single-letter category code classifying an assessment's domain.
///
/// The codes match the catalog data: `C` (cognitive), `P` (personality and
/// behavior), `K` (knowledge and skills), `S` (situational judgment) and
/// `O` (everything else).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "C")]
    Cognitive,
    #[serde(rename = "P")]
    Personality,
    #[serde(rename = "K")]
    Knowledge,
    #[serde(rename = "S")]
    Situational,
    #[serde(rename = "O")]
    Other,
}

impl TestType {
    /// The single-letter code used in the catalog data.
    pub fn code(&self) -> &'static str {
        match self {
            TestType::Cognitive => "C",
            TestType::Personality => "P",
            TestType::Knowledge => "K",
            TestType::Situational => "S",
            TestType::Other => "O",
        }
    }

    /// Catalog category name for this code.
    pub fn category_name(&self) -> &'static str {
        match self {
            TestType::Cognitive => "Cognitive Ability",
            TestType::Personality => "Personality & Behavior",
            TestType::Knowledge => "Knowledge & Skills",
            TestType::Situational => "Situational Judgment",
            TestType::Other => "Other",
        }
    }

    /// Display name used in the API `test_type` list.
    pub fn display_name(&self) -> &'static str {
        match self {
            TestType::Cognitive => "Ability & Aptitude",
            TestType::Personality => "Personality & Behavior",
            TestType::Knowledge => "Knowledge & Skills",
            TestType::Situational => "Simulations",
            TestType::Other => "Other",
        }
    }

    /// Parse a single-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "C" => Some(TestType::Cognitive),
            "P" => Some(TestType::Personality),
            "K" => Some(TestType::Knowledge),
            "S" => Some(TestType::Situational),
            "O" => Some(TestType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// =============================================================================
// Assessment
// =============================================================================

/// A single catalog record. Never mutated after ingestion.
///
/// The serde field names follow the scraped catalog JSON
/// (`assessment_name`, `duration`, `adaptive_support`/`remote_support` as
/// `"Yes"`/`"No"` strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    #[serde(rename = "assessment_name")]
    pub name: String,
    /// Unique key across the catalog.
    pub url: String,
    #[serde(default)]
    pub description: String,
    /// Free-text category label from the catalog page.
    #[serde(default)]
    pub category: String,
    pub test_type: TestType,
    #[serde(rename = "duration")]
    pub duration_minutes: u32,
    #[serde(with = "yes_no")]
    pub adaptive_support: bool,
    #[serde(with = "yes_no")]
    pub remote_support: bool,
}

impl Assessment {
    /// Text representation embedded for retrieval: concatenated name,
    /// description, category and test-type code.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name, self.description, self.category, self.test_type
        )
        .trim()
        .to_string()
    }
}

/// Serialize/deserialize booleans as the catalog's `"Yes"`/`"No"` strings.
pub mod yes_no {
    use serde::de::{self, Deserializer};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "Yes" } else { "No" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Yes" | "yes" => Ok(true),
            "No" | "no" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected \"Yes\" or \"No\", got {other:?}"
            ))),
        }
    }
}

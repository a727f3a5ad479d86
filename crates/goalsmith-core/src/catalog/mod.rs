//! Prompt catalog: the static reference data interpolated into every
//! generation prompt.
//!
//! The catalog is a JSON document keyed by department name (each holding a
//! list of example goals) plus three global lists: core values, 3E framework
//! labels and company top bets. A default document is embedded in the binary
//! at compile time; an alternate file can be loaded at startup. Once loaded
//! the catalog is never mutated.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// The embedded catalog document.
static BUNDLED_PROMPTS: &str = include_str!("prompts.json");

/// Errors from loading a catalog document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read prompt catalog at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("prompt catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Example goals for one department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentPrompts {
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Read-only prompt reference data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCatalog {
    #[serde(default)]
    pub core_values: Vec<String>,
    #[serde(default)]
    pub framework_3e: Vec<String>,
    #[serde(default)]
    pub company_top_bets: Vec<String>,
    /// Keyed by lower-cased department name.
    #[serde(flatten)]
    departments: BTreeMap<String, DepartmentPrompts>,
}

impl PromptCatalog {
    /// Parse a catalog document. Department keys are lower-cased; keys
    /// that collide after lower-casing have their examples concatenated in
    /// key order.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut catalog: PromptCatalog = serde_json::from_str(json)?;
        let mut departments: BTreeMap<String, DepartmentPrompts> = BTreeMap::new();
        for (name, prompts) in std::mem::take(&mut catalog.departments) {
            let key = name.to_lowercase();
            match departments.get_mut(&key) {
                Some(existing) => {
                    tracing::warn!(
                        department = %name,
                        merged_into = %key,
                        "merging case-variant department key"
                    );
                    existing.examples.extend(prompts.examples);
                }
                None => {
                    departments.insert(key, prompts);
                }
            }
        }
        catalog.departments = departments;
        Ok(catalog)
    }

    /// The catalog embedded at compile time.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_PROMPTS)
    }

    /// Load a catalog document from disk.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Example goals for `department` (case-insensitive). Unknown
    /// departments yield an empty slice.
    pub fn examples_for(&self, department: &str) -> &[String] {
        self.departments
            .get(&department.to_lowercase())
            .map(|d| d.examples.as_slice())
            .unwrap_or_default()
    }

    /// Department names known to the catalog, lower-cased and sorted.
    pub fn departments(&self) -> impl Iterator<Item = &str> {
        self.departments.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let catalog = PromptCatalog::bundled().unwrap();
        assert!(!catalog.core_values.is_empty());
        assert_eq!(catalog.framework_3e.len(), 3);
        assert!(!catalog.company_top_bets.is_empty());
        assert!(catalog.departments().any(|d| d == "engineering"));
    }

    #[test]
    fn department_lookup_is_case_insensitive() {
        let catalog = PromptCatalog::bundled().unwrap();
        let lower = catalog.examples_for("engineering");
        assert!(!lower.is_empty());
        assert_eq!(catalog.examples_for("ENGINEERING"), lower);
        assert_eq!(catalog.examples_for("Engineering"), lower);
    }

    #[test]
    fn unknown_department_has_no_examples() {
        let catalog = PromptCatalog::bundled().unwrap();
        assert!(catalog.examples_for("astrology").is_empty());
    }

    #[test]
    fn mixed_case_keys_are_normalized() {
        let catalog = PromptCatalog::from_json(
            r#"{"core_values": ["Own it"], "Legal": {"examples": ["Close 10 contracts"]}}"#,
        )
        .unwrap();
        assert_eq!(catalog.examples_for("legal"), ["Close 10 contracts".to_string()]);
        assert!(catalog.framework_3e.is_empty());
    }

    #[test]
    fn case_variant_keys_are_merged() {
        let catalog = PromptCatalog::from_json(
            r#"{"Legal": {"examples": ["Close 10 contracts"]}, "legal": {"examples": ["Cut review time"]}}"#,
        )
        .unwrap();
        assert_eq!(
            catalog.examples_for("LEGAL"),
            ["Close 10 contracts".to_string(), "Cut review time".to_string()]
        );
        assert_eq!(catalog.departments().collect::<Vec<_>>(), ["legal"]);
    }

    #[test]
    fn serializes_back_to_document_shape() {
        let catalog = PromptCatalog::bundled().unwrap();
        let value = serde_json::to_value(&catalog).unwrap();
        assert!(value["core_values"].is_array());
        assert!(value["engineering"]["examples"].is_array());
        let reparsed = PromptCatalog::from_json(&value.to_string()).unwrap();
        assert_eq!(reparsed, catalog);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("prompts.json");
        std::fs::write(&path, r#"{"company_top_bets": ["Scale"]}"#).unwrap();

        let catalog = PromptCatalog::load(&path).unwrap();
        assert_eq!(catalog.company_top_bets, vec!["Scale".to_string()]);
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = PromptCatalog::load(Path::new("/nonexistent/prompts.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn invalid_json_is_parse_error() {
        let err = PromptCatalog::from_json("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}

//! Recycling taxonomy: primary categories and the descriptors that name them.
//!
//! The taxonomy is built once at startup, either from the built-in table or
//! from a TOML file, and flattened into a [`LabelIndex`] for classification.
//!
//! ```toml
//! [[category]]
//! name = "glass"
//! descriptors = ["glass bottle", "glass jar"]
//! ```

pub mod aggregate;
pub mod index;

pub use aggregate::aggregate;
pub use index::{CategoryId, IndexedLabel, LabelIndex};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One primary category and its ordered descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    /// Category identifier shown to users (e.g. "plastic")
    pub name: String,
    /// Natural-language phrases used as zero-shot labels
    pub descriptors: Vec<String>,
}

/// Ordered mapping from category to descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyTable {
    #[serde(rename = "category", default)]
    categories: Vec<CategoryEntry>,
}

/// Built-in waste categories, in display order.
const BUILTIN: &[(&str, &[&str])] = &[
    (
        "plastic",
        &[
            "plastic bottle",
            "plastic container",
            "plastic bag",
            "plastic film",
            "PET container",
            "HDPE container",
            "plastic shopping bag",
        ],
    ),
    (
        "paper",
        &[
            "sheet of paper",
            "newspaper",
            "magazine",
            "leaflet",
            "office paper",
            "newsprint",
            "recycled paper",
        ],
    ),
    (
        "cardboard",
        &[
            "cardboard box",
            "cardboard packaging",
            "corrugated cardboard",
            "packing cardboard",
            "shipping box",
        ],
    ),
    (
        "tetra pak",
        &[
            "tetra pak container",
            "tetra pak juice box",
            "tetra pak milk carton",
            "composite carton",
        ],
    ),
    (
        "aluminum",
        &[
            "aluminum can",
            "metal container",
            "aluminum foil",
            "beverage can",
            "aluminum sheet",
        ],
    ),
    (
        "hazardous material",
        &[
            "used battery",
            "hazardous chemical product",
            "toxic waste",
            "used oil",
            "flammable product",
            "medical waste",
        ],
    ),
    (
        "glass",
        &[
            "glass bottle",
            "drinking glass",
            "glass jar",
            "glass container",
            "clear glass",
            "colored glass",
        ],
    ),
    (
        "organic",
        &[
            "food scraps",
            "organic waste",
            "fruit peel",
            "dry leaves",
            "vegetable scraps",
            "biodegradable waste",
        ],
    ),
    (
        "other",
        &[
            "other kind of waste",
            "mixed material",
            "unclassified waste",
            "hard plastics",
            "textile waste",
        ],
    ),
];

impl TaxonomyTable {
    /// Build a table from `(category, descriptors)` pairs, preserving order.
    pub fn new<C, D, S>(categories: C) -> Self
    where
        C: IntoIterator<Item = (S, D)>,
        D: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|(name, descriptors)| CategoryEntry {
                    name: name.into(),
                    descriptors: descriptors.into_iter().map(Into::into).collect(),
                })
                .collect(),
        }
    }

    /// The built-in recycling taxonomy.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|(name, descriptors)| (*name, descriptors.iter().copied())),
        )
    }

    /// Load a taxonomy from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let table: TaxonomyTable = toml::from_str(&content)?;
        if table.categories.is_empty() {
            return Err(ConfigError::Taxonomy(format!(
                "{} defines no categories",
                path.display()
            )));
        }
        tracing::info!(
            "Loaded taxonomy from {:?}: {} categories",
            path,
            table.categories.len()
        );
        Ok(table)
    }

    /// Load the configured taxonomy file, or fall back to the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Categories in definition order.
    pub fn categories(&self) -> &[CategoryEntry] {
        &self.categories
    }

    /// Total number of descriptors across all categories.
    pub fn descriptor_count(&self) -> usize {
        self.categories.iter().map(|c| c.descriptors.len()).sum()
    }

    /// Serialize the table to TOML (the same shape [`TaxonomyTable::load`] reads).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Taxonomy(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_shape() {
        let table = TaxonomyTable::builtin();
        assert_eq!(table.categories().len(), 9);
        assert_eq!(table.categories()[0].name, "plastic");
        assert_eq!(table.categories()[8].name, "other");
        assert!(table
            .categories()
            .iter()
            .all(|c| (4..=7).contains(&c.descriptors.len())));
        assert_eq!(table.descriptor_count(), 51);
    }

    #[test]
    fn test_builtin_builds_valid_index() {
        let index = LabelIndex::build(&TaxonomyTable::builtin()).unwrap();
        assert_eq!(index.len(), 51);
        assert_eq!(index.category_count(), 9);
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.toml");
        std::fs::write(
            &path,
            r#"
[[category]]
name = "glass"
descriptors = ["glass bottle", "glass jar"]

[[category]]
name = "paper"
descriptors = ["newspaper"]
"#,
        )
        .unwrap();

        let table = TaxonomyTable::load(&path).unwrap();
        assert_eq!(
            table,
            TaxonomyTable::new([
                ("glass", vec!["glass bottle", "glass jar"]),
                ("paper", vec!["newspaper"]),
            ])
        );
    }

    #[test]
    fn test_load_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.toml");
        std::fs::write(&path, "").unwrap();

        let err = TaxonomyTable::load(&path).unwrap_err();
        assert!(err.to_string().contains("no categories"));
    }

    #[test]
    fn test_toml_roundtrip_preserves_order() {
        let table = TaxonomyTable::builtin();
        let toml = table.to_toml().unwrap();
        let parsed: TaxonomyTable = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn test_load_or_builtin_without_path() {
        let table = TaxonomyTable::load_or_builtin(None).unwrap();
        assert_eq!(table, TaxonomyTable::builtin());
    }
}

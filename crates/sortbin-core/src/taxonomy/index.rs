//! Flattened descriptor index used to align classifier output with categories.
//!
//! Each descriptor is zipped with its category exactly once, at build time, so
//! position `i` of a score distribution always maps to `labels()[i].category`.

use std::collections::{HashMap, HashSet};

use crate::error::ConfigError;

use super::TaxonomyTable;

/// Position of a category in the taxonomy's definition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(usize);

impl CategoryId {
    /// Index into [`LabelIndex::categories`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// A descriptor paired with its owning category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedLabel {
    pub descriptor: String,
    pub category: CategoryId,
}

/// Ordered `(descriptor, category)` records plus a reverse lookup.
#[derive(Debug, Clone)]
pub struct LabelIndex {
    categories: Vec<String>,
    labels: Vec<IndexedLabel>,
    by_descriptor: HashMap<String, CategoryId>,
}

impl LabelIndex {
    /// Flatten and validate a taxonomy table.
    ///
    /// Fails on blank or repeated category names, empty categories, blank
    /// descriptors, and any descriptor that appears more than once anywhere
    /// in the table.
    pub fn build(table: &TaxonomyTable) -> Result<Self, ConfigError> {
        let mut categories = Vec::with_capacity(table.categories().len());
        let mut labels = Vec::with_capacity(table.descriptor_count());
        let mut by_descriptor = HashMap::with_capacity(table.descriptor_count());
        let mut seen_categories = HashSet::new();

        for (idx, entry) in table.categories().iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Taxonomy(format!(
                    "category #{} has a blank name",
                    idx + 1
                )));
            }
            if !seen_categories.insert(entry.name.as_str()) {
                return Err(ConfigError::Taxonomy(format!(
                    "duplicate category {:?}",
                    entry.name
                )));
            }
            if entry.descriptors.is_empty() {
                return Err(ConfigError::Taxonomy(format!(
                    "category {:?} has no descriptors",
                    entry.name
                )));
            }

            let id = CategoryId(idx);
            for descriptor in &entry.descriptors {
                if descriptor.trim().is_empty() {
                    return Err(ConfigError::Taxonomy(format!(
                        "category {:?} has a blank descriptor",
                        entry.name
                    )));
                }
                if let Some(owner) = by_descriptor.insert(descriptor.clone(), id) {
                    return Err(ConfigError::Taxonomy(format!(
                        "duplicate descriptor {:?} (in {:?} and {:?})",
                        descriptor,
                        table.categories()[owner.index()].name,
                        entry.name
                    )));
                }
                labels.push(IndexedLabel {
                    descriptor: descriptor.clone(),
                    category: id,
                });
            }
            categories.push(entry.name.clone());
        }

        tracing::debug!(
            "Built label index: {} descriptors across {} categories",
            labels.len(),
            categories.len()
        );

        Ok(Self {
            categories,
            labels,
            by_descriptor,
        })
    }

    /// Indexed records in classifier order.
    pub fn labels(&self) -> &[IndexedLabel] {
        &self.labels
    }

    /// Descriptor strings in classifier order.
    pub fn descriptors(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.descriptor.clone()).collect()
    }

    /// Category names in definition order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Name of a category.
    pub fn category_name(&self, id: CategoryId) -> &str {
        &self.categories[id.0]
    }

    /// Category that owns a descriptor.
    pub fn category_of(&self, descriptor: &str) -> Option<&str> {
        self.by_descriptor
            .get(descriptor)
            .map(|&id| self.category_name(id))
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the index holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of categories.
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

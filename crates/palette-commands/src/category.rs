//! Ordered palette categories

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::CommandEntry;

/// Bucket for entries without a known category
pub const DEFAULT_CATEGORY: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub label: Option<String>,
}

/// A category and its entries, as rendered
#[derive(Debug, Clone)]
pub struct CategoryGroup {
    pub category: Category,
    pub entries: Vec<CommandEntry>,
}

/// Categories in display order. Always contains [`DEFAULT_CATEGORY`].
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    categories: Vec<Category>,
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self {
            categories: vec![Category {
                id: DEFAULT_CATEGORY.to_string(),
                label: None,
            }],
        }
    }
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Categories in the given order, `default` appended when missing
    pub fn with_categories<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<Category> = Vec::new();
        for id in ids {
            let id = id.into();
            if !categories.iter().any(|c| c.id == id) {
                categories.push(Category { id, label: None });
            }
        }
        if !categories.iter().any(|c| c.id == DEFAULT_CATEGORY) {
            categories.push(Category {
                id: DEFAULT_CATEGORY.to_string(),
                label: None,
            });
        }
        Self { categories }
    }

    /// Register a category ahead of `default`; re-adding only updates the label
    pub fn add(&mut self, id: impl Into<String>, label: Option<String>) {
        let id = id.into();
        if let Some(existing) = self.categories.iter_mut().find(|c| c.id == id) {
            existing.label = label;
            return;
        }
        let at = self
            .categories
            .iter()
            .position(|c| c.id == DEFAULT_CATEGORY)
            .unwrap_or(self.categories.len());
        self.categories.insert(at, Category { id, label });
    }

    /// Remove a category. `default` cannot be removed.
    pub fn remove(&mut self, id: &str) -> bool {
        if id == DEFAULT_CATEGORY {
            return false;
        }
        let before = self.categories.len();
        self.categories.retain(|c| c.id != id);
        self.categories.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Display position of `id`; unknown ids fall into `default`
    pub fn position(&self, id: Option<&str>) -> usize {
        let id = id.unwrap_or(DEFAULT_CATEGORY);
        self.categories
            .iter()
            .position(|c| c.id == id)
            .or_else(|| {
                warn!(category = %id, "Unknown category, using default");
                self.categories.iter().position(|c| c.id == DEFAULT_CATEGORY)
            })
            .unwrap_or(0)
    }

    /// Partition entries by category, in category order.
    ///
    /// Entries keep their incoming order within a category; empty
    /// categories are omitted.
    pub fn group(&self, entries: Vec<CommandEntry>) -> Vec<CategoryGroup> {
        let mut buckets: Vec<Vec<CommandEntry>> = vec![Vec::new(); self.categories.len()];
        for entry in entries {
            let idx = self.position(entry.category.as_deref());
            buckets[idx].push(entry);
        }
        self.categories
            .iter()
            .cloned()
            .zip(buckets)
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(category, entries)| CategoryGroup { category, entries })
            .collect()
    }
}

//! Standard-category catalog: resolves free-text category labels to
//! canonical garment categories.
//!
//! Matching is exact equality (lowercased, trimmed) against a
//! category's canonical name or any of its keyword aliases — never
//! substring containment, so "crop top" does not accidentally hit a
//! category aliased as "top". Aliases are not unique across the
//! catalog; when two categories claim the same literal the resolver
//! reports the ambiguity instead of picking one.

use serde::{Deserialize, Serialize};

/// One canonical category with its keyword aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Stable category code.
    pub code: String,
    /// Canonical English name (also used as the resolved value).
    pub name: String,
    /// Keyword aliases, matched verbatim after trim/lowercase.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Outcome of resolving a free-text category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMatch {
    /// No catalog entry claims the label.
    NotFound,
    /// Exactly one category matched; carries the canonical name
    /// (lowercased, as rule tables key on it).
    Unique(String),
    /// Two or more distinct categories claim the same literal.
    Ambiguous(Vec<String>),
}

/// Read-only category catalog.
#[derive(Debug, Clone, Default)]
pub struct CategoryCatalog {
    definitions: Vec<CategoryDefinition>,
}

impl CategoryCatalog {
    pub fn new(definitions: Vec<CategoryDefinition>) -> Self {
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Resolve a free-text label to a canonical category.
    pub fn resolve(&self, text: &str) -> CategoryMatch {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return CategoryMatch::NotFound;
        }

        let mut matches: Vec<String> = Vec::new();
        for definition in &self.definitions {
            let canonical = definition.name.trim().to_lowercase();
            let hit = canonical == needle
                || definition
                    .keywords
                    .iter()
                    .any(|keyword| keyword.trim().to_lowercase() == needle);
            if hit && !matches.contains(&canonical) {
                matches.push(canonical);
            }
        }

        match matches.len() {
            0 => CategoryMatch::NotFound,
            1 => CategoryMatch::Unique(matches.remove(0)),
            _ => CategoryMatch::Ambiguous(matches),
        }
    }
}

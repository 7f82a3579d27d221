//! Validated composition map and the parse entry point.
//!
//! A [`Composition`] is an insertion-ordered mapping from canonical
//! fiber label to percentage. Percentages are kept exactly as parsed;
//! nothing is normalized to 100 and nothing checks the sum, because
//! real-world cells routinely total 99 or 101.

use crate::extract::{merged_pairs, segment_pairs};
use crate::normalize::normalize_composition;
use crate::registry::FiberRegistry;

/// Insertion-ordered fiber label → percentage map.
///
/// Insertion order is significant: downstream aggregation breaks ties
/// by first-seen order, so the map must not reorder entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composition {
    entries: Vec<(String, f64)>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a label. The first insertion of a label wins; repeats
    /// are ignored and reported as `false`.
    pub fn insert(&mut self, label: impl Into<String>, percentage: f64) -> bool {
        let label = label.into();
        if self.get(&label).is_some() {
            return false;
        }
        self.entries.push((label, percentage));
        true
    }

    /// Case-insensitive lookup.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, pct)| *pct)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, pct)| (name.as_str(), *pct))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of parsing one composition cell against the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Every extracted label matched the registry.
    Parsed(Composition),
    /// No (label, percentage) pairs could be extracted at all.
    NoPairs,
    /// Pairs were extracted but at least one label is not registered;
    /// the whole composition is rejected (all-or-nothing policy).
    Unregistered,
}

/// Parse a raw composition cell into a validated [`Composition`].
///
/// The segment pass is the primary method: when it consumes the whole
/// normalized string as a clean text/number alternation and every
/// label validates against the registry, its result is used outright.
/// Otherwise candidates from both passes are merged, overlap-resolved
/// and validated strictly — one unregistered label voids the result.
///
/// Pure function of the input string and registry; parsing the same
/// cell twice yields identical outcomes.
pub fn parse_composition(raw: &str, registry: &FiberRegistry) -> ParseOutcome {
    let text = normalize_composition(raw);

    let scan = segment_pairs(&text);
    if scan.complete && !scan.pairs.is_empty() {
        if let Some(composition) = registry.canonicalize(&scan.pairs) {
            return ParseOutcome::Parsed(composition);
        }
    }

    let merged = merged_pairs(&text);
    if merged.is_empty() {
        return ParseOutcome::NoPairs;
    }
    match registry.canonicalize(&merged) {
        Some(composition) => ParseOutcome::Parsed(composition),
        None => {
            tracing::debug!(composition = raw, "unregistered fiber label in composition");
            ParseOutcome::Unregistered
        }
    }
}

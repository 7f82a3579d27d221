//! Fiber registry: the closed world of recognized fiber names.
//!
//! Every extracted label is validated against this registry with a
//! case-insensitive exact match on the full label, internal spaces and
//! parentheses included. Unknown labels are rejected outright — the
//! registry is the single source of truth and nothing is guessed.
//!
//! The registry also drives aggregation: each fiber maps to a major
//! and a minor fiber-category code, and a composition's dominant
//! categories are the argmax of the per-code percentage sums.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::composition::Composition;

/// One registered fiber with its category classification.
///
/// Category codes are normalized at registry construction: lowercased
/// with underscores removed, so `MAN_MADE` and `manmade` compare equal
/// against rule-table fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiberEntry {
    /// Canonical label, case preserved for output.
    pub name: String,
    pub major_code: String,
    pub major_name: String,
    pub minor_code: String,
    pub minor_name: String,
}

fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Read-only fiber dictionary, loaded once per classification run.
#[derive(Debug, Clone)]
pub struct FiberRegistry {
    entries: Vec<FiberEntry>,
    by_name: HashMap<String, usize>,
}

impl FiberRegistry {
    /// Build a registry, rejecting duplicate canonical names
    /// (case-insensitive). A duplicate is malformed reference data
    /// and fatal to the whole batch.
    pub fn new(mut entries: Vec<FiberEntry>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter_mut().enumerate() {
            entry.major_code = normalize_code(&entry.major_code);
            entry.minor_code = normalize_code(&entry.minor_code);
            let key = entry.name.trim().to_uppercase();
            if key.is_empty() {
                bail!("fiber registry entry {idx} has an empty name");
            }
            if by_name.insert(key, idx).is_some() {
                bail!("duplicate fiber name in registry: {:?}", entry.name);
            }
        }
        Ok(Self { entries, by_name })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive exact lookup on the full label.
    pub fn lookup(&self, label: &str) -> Option<&FiberEntry> {
        self.by_name
            .get(&label.trim().to_uppercase())
            .map(|idx| &self.entries[*idx])
    }

    /// Validate raw (label, percentage) pairs against the registry.
    ///
    /// All-or-nothing: if any label fails to match, the whole
    /// composition is rejected and `None` is returned. On success the
    /// labels are replaced by the registry's canonical casing.
    pub fn canonicalize(&self, pairs: &[(String, f64)]) -> Option<Composition> {
        let mut composition = Composition::new();
        for (label, percentage) in pairs {
            let entry = self.lookup(label)?;
            composition.insert(entry.name.clone(), *percentage);
        }
        Some(composition)
    }

    /// Aggregate a validated composition into its dominant
    /// (major, minor) category codes.
    ///
    /// Percentages are summed per code in first-seen order and the
    /// argmax of each map is selected; ties keep the earlier code.
    /// An empty composition yields `Ok(None)`. A label that no longer
    /// resolves is malformed reference data and surfaces as an error
    /// for the row boundary to catch.
    pub fn dominant_categories(
        &self,
        composition: &Composition,
    ) -> Result<Option<(String, String)>> {
        if composition.is_empty() {
            return Ok(None);
        }

        let mut major_totals: Vec<(String, f64)> = Vec::new();
        let mut minor_totals: Vec<(String, f64)> = Vec::new();

        for (label, percentage) in composition.iter() {
            let entry = self
                .lookup(label)
                .with_context(|| format!("fiber {label:?} missing from registry"))?;
            accumulate(&mut major_totals, &entry.major_code, percentage);
            accumulate(&mut minor_totals, &entry.minor_code, percentage);
        }

        Ok(Some((argmax(&major_totals), argmax(&minor_totals))))
    }
}

fn accumulate(totals: &mut Vec<(String, f64)>, code: &str, percentage: f64) {
    match totals.iter_mut().find(|(existing, _)| existing == code) {
        Some((_, sum)) => *sum += percentage,
        None => totals.push((code.to_string(), percentage)),
    }
}

/// First-seen entry wins on ties: only a strictly greater sum
/// displaces the current maximum.
fn argmax(totals: &[(String, f64)]) -> String {
    let mut best = &totals[0];
    for candidate in &totals[1..] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best.0.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, major: &str, minor: &str) -> FiberEntry {
        FiberEntry {
            name: name.to_string(),
            major_code: major.to_string(),
            major_name: major.to_string(),
            minor_code: minor.to_string(),
            minor_name: minor.to_string(),
        }
    }

    fn registry() -> FiberRegistry {
        FiberRegistry::new(vec![
            entry("Cotton", "cotton", "cotton"),
            entry("Modal", "MAN_MADE", "rayon"),
            entry("Polyester", "MAN_MADE", "polyester"),
            entry("Merino Wool", "wool", "wool"),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = FiberRegistry::new(vec![
            entry("Cotton", "cotton", "cotton"),
            entry("COTTON", "cotton", "cotton"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(FiberRegistry::new(vec![entry("  ", "a", "b")]).is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive_exact() {
        let registry = registry();
        assert!(registry.lookup("cotton").is_some());
        assert!(registry.lookup("MERINO WOOL").is_some());
        // Exact match on the full label, not substring
        assert!(registry.lookup("MERINO").is_none());
        assert!(registry.lookup("COT").is_none());
    }

    #[test]
    fn test_codes_normalized() {
        let registry = registry();
        let modal = registry.lookup("modal").unwrap();
        assert_eq!(modal.major_code, "manmade");
    }

    #[test]
    fn test_canonicalize_all_or_nothing() {
        let registry = registry();
        let pairs = vec![("COTTON".to_string(), 50.0), ("UNKNOWN".to_string(), 50.0)];
        assert!(registry.canonicalize(&pairs).is_none());

        let pairs = vec![("COTTON".to_string(), 100.0)];
        let comp = registry.canonicalize(&pairs).unwrap();
        assert_eq!(comp.iter().next().unwrap().0, "Cotton");
    }

    #[test]
    fn test_dominant_categories_sums_per_code() {
        let registry = registry();
        // Modal 40 + Polyester 35 share major "manmade" (75) which
        // beats cotton (25); minor argmax is rayon (40).
        let pairs = vec![
            ("MODAL".to_string(), 40.0),
            ("POLYESTER".to_string(), 35.0),
            ("COTTON".to_string(), 25.0),
        ];
        let comp = registry.canonicalize(&pairs).unwrap();
        let (major, minor) = registry.dominant_categories(&comp).unwrap().unwrap();
        assert_eq!(major, "manmade");
        assert_eq!(minor, "rayon");
    }

    #[test]
    fn test_dominant_categories_tie_keeps_first_seen() {
        let registry = registry();
        let pairs = vec![
            ("POLYESTER".to_string(), 50.0),
            ("COTTON".to_string(), 50.0),
        ];
        let comp = registry.canonicalize(&pairs).unwrap();
        let (major, minor) = registry.dominant_categories(&comp).unwrap().unwrap();
        assert_eq!(major, "manmade");
        assert_eq!(minor, "polyester");
    }

    #[test]
    fn test_dominant_categories_empty() {
        let registry = registry();
        assert!(registry
            .dominant_categories(&Composition::new())
            .unwrap()
            .is_none());
    }
}

//! Composition-string cleanup ahead of pair extraction.
//!
//! Raw spreadsheet cells mix fiber percentages with placement labels
//! and secondary-part sections. [`normalize_composition`] reduces a
//! cell to the main-body composition text in four ordered steps:
//!
//! 1. Truncate at the first secondary-part keyword (everything from
//!    the keyword onward is discarded).
//! 2. Remove bracket-wrapped placement labels, e.g. `(SHELL1)`.
//! 3. Remove bare main-body labels, e.g. `MAIN2`.
//! 4. Collapse whitespace runs and trim.
//!
//! The steps are order-dependent: truncation must see the original
//! text so that a `(LINING)` marker still cuts off the lining section
//! before bracket removal could erase it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::labels::{bracket_labels, MAIN_LABELS, SECONDARY_PARTS};

fn alternation(labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|")
}

/// First occurrence of any secondary-part keyword, word-bounded.
static SECONDARY_RE: Lazy<Regex> = Lazy::new(|| {
    let mut labels: Vec<&str> = SECONDARY_PARTS.to_vec();
    labels.sort_by_key(|label| std::cmp::Reverse(label.len()));
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation(&labels))).unwrap()
});

/// Bracket-wrapped placement labels, optionally numbered: `(SHELL1)`.
static BRACKET_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\(\s*(?:{})\d*\s*\)",
        alternation(&bracket_labels())
    ))
    .unwrap()
});

/// Bare main-body labels, optionally numbered: `MAIN2`.
static MAIN_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\d*\b", alternation(MAIN_LABELS))).unwrap()
});

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip noise labels from a raw composition cell.
///
/// Empty input yields an empty string; the caller decides whether an
/// empty composition is an error.
pub fn normalize_composition(raw: &str) -> String {
    let truncated = match SECONDARY_RE.find(raw) {
        Some(m) => &raw[..m.start()],
        None => raw,
    };

    let without_brackets = BRACKET_LABEL_RE.replace_all(truncated, " ");
    let without_main = MAIN_LABEL_RE.replace_all(&without_brackets, " ");

    WHITESPACE_RE
        .replace_all(&without_main, " ")
        .trim()
        .to_string()
}

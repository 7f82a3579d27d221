//! Fixed noise-label lists used when cleaning composition strings.
//!
//! Garment composition cells frequently carry placement labels next to
//! the fiber percentages ("(SHELL) COTTON 100%", "MAIN1 WOOL 80%") and
//! trailing sections describing secondary parts ("... RIB: COTTON 95%
//! SPANDEX 5%"). Only the main body of the garment drives tariff
//! classification, so everything from the first secondary-part keyword
//! onward is discarded and placement labels are stripped.
//!
//! These lists are process-wide immutable configuration. They are not
//! user-editable: unknown labels that survive cleaning will simply fail
//! registry validation downstream.

/// Placement labels naming the main body of the garment.
///
/// These appear bare ("MAIN2"), or bracket-wrapped ("(SHELL1)"), and
/// are removed wherever they occur before the string reaches the
/// extractor.
pub const MAIN_LABELS: &[&str] = &[
    "SHELL", "MAIN", "EXTERIOR", "TOP", "BOTTOM", "OUTSHELL", "FACE", "BACK",
];

/// Keywords introducing a secondary part of the garment.
///
/// The first occurrence of any of these truncates the composition
/// string: the keyword and everything after it is dropped, not just
/// the keyword itself.
pub const SECONDARY_PARTS: &[&str] = &[
    "RIB",
    "LINING",
    "ATTACHED",
    "INTERIOR",
    "COMPONENT",
    "TRIM",
    "FILL",
    "FILLING",
    "FILLER",
    "DETACHABLE COLLAR",
    "COLLAR",
    "DETACHABLE COLLAR LINING",
    "MESH",
    "CONTRAST",
    "BASE",
    "MEFFLER",
    "YARN",
];

/// All placement labels eligible for bracket-wrapped removal,
/// longest first so multi-word labels win over their prefixes in a
/// regex alternation.
pub(crate) fn bracket_labels() -> Vec<&'static str> {
    let mut labels: Vec<&str> = MAIN_LABELS
        .iter()
        .chain(SECONDARY_PARTS.iter())
        .copied()
        .collect();
    labels.sort_by_key(|label| std::cmp::Reverse(label.len()));
    labels
}

//! Extraction of (fiber label, percentage) pairs from a normalized
//! composition string.
//!
//! Two extraction methods feed one overlap-resolved candidate set:
//!
//! - **Segment pass**: scan the string into alternating runs of
//!   letters/spaces/parentheses ("text") and digits/'.' ("number"),
//!   pairing each text run with the number run that follows it. This
//!   is the primary method and the only one that handles back-to-back
//!   compositions like `COTTON60MODAL40`.
//! - **Pattern pass**: three ordered regex families covering
//!   percent-before-label (`70% POLYESTER`), label-before-percent
//!   (`POLYESTER 70%`) and label-glued-to-digits (`POLYESTER70`),
//!   each tolerating multi-word labels and parenthesized qualifiers.
//!
//! Candidates from both passes carry their byte span; overlapping
//! spans are resolved deterministically (start ascending, then span
//! length descending, then segment pass before pattern families) and
//! only the first occurrence of a label is kept. The ordering is
//! fixed and is itself part of the contract: ambiguous strings parse
//! the same way on every run.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum label length (spaces and parentheses stripped) for a
/// segment-pass candidate. Guards against spurious one- and
/// two-letter captures next to stray digits.
const MIN_SEGMENT_LABEL_LEN: usize = 3;

/// Which extraction method produced a candidate. Variant order is the
/// tie-break priority at equal start and span length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    Segment,
    PercentFirst,
    LabelFirst,
    Concatenated,
}

#[derive(Debug, Clone)]
struct Candidate {
    label: String,
    percentage: f64,
    start: usize,
    end: usize,
    source: Source,
}

/// Result of the segment pass over a normalized string.
#[derive(Debug, Clone, Default)]
pub struct SegmentScan {
    /// Extracted (label, percentage) pairs in string order.
    pub pairs: Vec<(String, f64)>,
    /// True when the scan consumed every run: the string was a clean
    /// text/number alternation starting with text, with no leftover
    /// runs. Only a complete scan is trusted as the sole parse;
    /// anything else goes through merged overlap resolution.
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RunKind {
    Text,
    Number,
}

#[derive(Debug, Clone)]
struct Run {
    kind: RunKind,
    start: usize,
    end: usize,
    content: String,
}

/// Split a string into alternating text and number runs, skipping any
/// other character ('%', ',', '/', ...).
fn scan_runs(text: &str) -> Vec<Run> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut runs = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        if c.is_alphabetic() {
            while i < chars.len() {
                let ch = chars[i].1;
                if ch.is_alphabetic() || ch.is_whitespace() || ch == '(' || ch == ')' {
                    i += 1;
                } else {
                    break;
                }
            }
            let end = chars.get(i).map_or(text.len(), |(pos, _)| *pos);
            let content = text[start..end].trim().to_string();
            if !content.is_empty() {
                runs.push(Run {
                    kind: RunKind::Text,
                    start,
                    end,
                    content,
                });
            }
        } else if c.is_ascii_digit() {
            while i < chars.len() {
                let ch = chars[i].1;
                if ch.is_ascii_digit() || ch == '.' {
                    i += 1;
                } else {
                    break;
                }
            }
            let end = chars.get(i).map_or(text.len(), |(pos, _)| *pos);
            runs.push(Run {
                kind: RunKind::Number,
                start,
                end,
                content: text[start..end].to_string(),
            });
        } else {
            i += 1;
        }
    }

    runs
}

fn segment_candidates(text: &str) -> (Vec<Candidate>, bool) {
    let runs = scan_runs(text);
    let mut candidates = Vec::new();
    let mut consumed = 0usize;

    let mut i = 0;
    while i + 1 < runs.len() {
        if runs[i].kind == RunKind::Text && runs[i + 1].kind == RunKind::Number {
            let label = runs[i].content.clone();
            let stripped: String = label
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
                .collect();
            if stripped.chars().count() >= MIN_SEGMENT_LABEL_LEN {
                if let Ok(percentage) = runs[i + 1].content.parse::<f64>() {
                    candidates.push(Candidate {
                        label,
                        percentage,
                        start: runs[i].start,
                        end: runs[i + 1].end,
                        source: Source::Segment,
                    });
                    consumed += 2;
                }
            }
            i += 2;
        } else {
            i += 1;
        }
    }

    let complete = !runs.is_empty() && consumed == runs.len();
    (candidates, complete)
}

/// `70% POLYESTER` — percentage, percent sign, then label.
static PERCENT_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*%\s*([A-Za-z]+(?:\s+[A-Za-z]+)*(?:\s*\([^)]*\))?)").unwrap()
});

/// `POLYESTER 70%` — label, then percentage with percent sign.
static LABEL_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]+(?:\s+[A-Za-z]+)*(?:\s*\([^)]*\))?)\s*(\d+(?:\.\d+)?)\s*%").unwrap()
});

/// `POLYESTER70` — label glued to digits, no percent sign or space.
static CONCATENATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z]+(?:\s+[A-Za-z]+)*(?:\s*\([^)]*\))?)(\d+(?:\.\d+)?)").unwrap()
});

fn pattern_candidates(text: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    let families: [(&Regex, Source, usize, usize); 3] = [
        (&PERCENT_FIRST_RE, Source::PercentFirst, 2, 1),
        (&LABEL_FIRST_RE, Source::LabelFirst, 1, 2),
        (&CONCATENATED_RE, Source::Concatenated, 1, 2),
    ];

    for (re, source, label_group, pct_group) in families {
        for caps in re.captures_iter(text) {
            let whole = caps.get(0).unwrap();
            let label = caps[label_group].trim().to_string();
            let Ok(percentage) = caps[pct_group].parse::<f64>() else {
                continue;
            };
            if label.is_empty() {
                continue;
            }
            candidates.push(Candidate {
                label,
                percentage,
                start: whole.start(),
                end: whole.end(),
                source,
            });
        }
    }

    candidates
}

/// Deterministic overlap resolution over candidates from all passes.
///
/// Sort order: start ascending, span length descending (a longer
/// match at the same start is the more specific one), then source
/// priority. A candidate is accepted only if its span does not
/// overlap any already-accepted span and its label (case-insensitive)
/// has not been accepted before.
fn resolve_overlaps(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then((b.end - b.start).cmp(&(a.end - a.start)))
            .then(a.source.cmp(&b.source))
    });

    let mut accepted: Vec<Candidate> = Vec::new();
    let mut seen_labels: Vec<String> = Vec::new();

    for candidate in candidates {
        let overlaps = accepted
            .iter()
            .any(|a| candidate.start < a.end && a.start < candidate.end);
        if overlaps {
            continue;
        }
        let key = candidate.label.to_uppercase();
        if seen_labels.contains(&key) {
            continue;
        }
        seen_labels.push(key);
        accepted.push(candidate);
    }

    accepted.sort_by_key(|c| c.start);
    accepted
}

fn to_pairs(candidates: Vec<Candidate>) -> Vec<(String, f64)> {
    candidates
        .into_iter()
        .map(|c| (c.label, c.percentage))
        .collect()
}

/// Run only the segment pass over a normalized string.
pub fn segment_pairs(text: &str) -> SegmentScan {
    let (candidates, complete) = segment_candidates(text);
    SegmentScan {
        pairs: to_pairs(candidates),
        complete,
    }
}

/// Run both passes and resolve overlaps into one non-overlapping set
/// of (label, percentage) pairs, ordered by position in the string.
///
/// An empty result means no pairs could be extracted; that is not an
/// error here, the pipeline reports it as an unparseable composition.
pub fn merged_pairs(text: &str) -> Vec<(String, f64)> {
    let (mut candidates, _) = segment_candidates(text);
    candidates.extend(pattern_candidates(text));
    to_pairs(resolve_overlaps(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs_of(scan: &SegmentScan) -> Vec<(&str, f64)> {
        scan.pairs.iter().map(|(l, p)| (l.as_str(), *p)).collect()
    }

    #[test]
    fn test_segment_label_then_percent() {
        let scan = segment_pairs("COTTON 100");
        assert_eq!(pairs_of(&scan), vec![("COTTON", 100.0)]);
        assert!(scan.complete);
    }

    #[test]
    fn test_segment_back_to_back() {
        let scan = segment_pairs("COTTON60MODAL40");
        assert_eq!(pairs_of(&scan), vec![("COTTON", 60.0), ("MODAL", 40.0)]);
        assert!(scan.complete);
    }

    #[test]
    fn test_segment_with_percent_signs() {
        // '%' is skipped by the run scanner
        let scan = segment_pairs("COTTON 60% MODAL 40%");
        assert_eq!(pairs_of(&scan), vec![("COTTON", 60.0), ("MODAL", 40.0)]);
        assert!(scan.complete);
    }

    #[test]
    fn test_segment_incomplete_on_percent_first_form() {
        // Leading number run means the pairing is unreliable; the
        // scan must not claim completeness.
        let scan = segment_pairs("70% POLYESTER 30% COTTON");
        assert!(!scan.complete);
    }

    #[test]
    fn test_segment_short_label_discarded() {
        let scan = segment_pairs("AB 100");
        assert!(scan.pairs.is_empty());
    }

    #[test]
    fn test_segment_parenthesized_qualifier() {
        let scan = segment_pairs("fabric silk (very soft)100LINEN26");
        assert_eq!(
            pairs_of(&scan),
            vec![("fabric silk (very soft)", 100.0), ("LINEN", 26.0)]
        );
        assert!(scan.complete);
    }

    #[test]
    fn test_segment_empty_input() {
        let scan = segment_pairs("");
        assert!(scan.pairs.is_empty());
        assert!(!scan.complete);
    }

    #[test]
    fn test_merged_percent_first() {
        let pairs = merged_pairs("70% POLYESTER 30% COTTON");
        assert_eq!(
            pairs,
            vec![("POLYESTER".to_string(), 70.0), ("COTTON".to_string(), 30.0)]
        );
    }

    #[test]
    fn test_merged_label_first() {
        let pairs = merged_pairs("POLYESTER 70% COTTON 30%");
        assert_eq!(
            pairs,
            vec![("POLYESTER".to_string(), 70.0), ("COTTON".to_string(), 30.0)]
        );
    }

    #[test]
    fn test_merged_mixed_ordering() {
        let pairs = merged_pairs("98% POLYURETHANE, COTTON 2%");
        assert_eq!(
            pairs,
            vec![
                ("POLYURETHANE".to_string(), 98.0),
                ("COTTON".to_string(), 2.0)
            ]
        );
    }

    #[test]
    fn test_merged_multi_word_label() {
        let pairs = merged_pairs("50% MERINO WOOL 50% COTTON");
        assert_eq!(
            pairs,
            vec![
                ("MERINO WOOL".to_string(), 50.0),
                ("COTTON".to_string(), 50.0)
            ]
        );
    }

    #[test]
    fn test_merged_decimal_percentages() {
        let pairs = merged_pairs("WOOL 52.5% COTTON 47.5%");
        assert_eq!(
            pairs,
            vec![("WOOL".to_string(), 52.5), ("COTTON".to_string(), 47.5)]
        );
    }

    #[test]
    fn test_merged_duplicate_label_first_wins() {
        let pairs = merged_pairs("COTTON 60% MODAL 20% COTTON 20%");
        assert_eq!(
            pairs,
            vec![("COTTON".to_string(), 60.0), ("MODAL".to_string(), 20.0)]
        );
    }

    #[test]
    fn test_merged_no_candidates() {
        assert!(merged_pairs("").is_empty());
        assert!(merged_pairs("no numbers here").is_empty());
    }

    #[test]
    fn test_merged_is_deterministic() {
        let input = "fabric silk (very soft)100LINEN26";
        assert_eq!(merged_pairs(input), merged_pairs(input));
    }
}

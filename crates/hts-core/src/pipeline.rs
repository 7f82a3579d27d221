//! Per-row classification pipeline.
//!
//! Each input row runs the fixed sequence: required-field validation →
//! weave type → standard category → gender → composition parse →
//! category aggregation → rule resolution. The first failing step
//! terminates the row with a typed [`FailureReason`]; nothing escapes
//! the row boundary, and one row's failure never affects another row.
//!
//! Rows share only the read-only reference tables, so batches fan out
//! across a rayon thread pool; results are re-sorted by row index so
//! callers always get outcomes in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::{CategoryCatalog, CategoryMatch};
use crate::composition::{parse_composition, ParseOutcome};
use crate::registry::FiberRegistry;
use crate::rules::{Gender, RuleTable, WeaveType};

/// Sentinel tariff code reported for rows that could not be
/// classified.
pub const UNKNOWN_HS_CODE: &str = "unknown";

/// The read-only reference tables a batch classifies against.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub registry: FiberRegistry,
    pub catalog: CategoryCatalog,
    pub rules: RuleTable,
}

/// One input row, as read from a spreadsheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowInput {
    pub style_no: String,
    #[serde(default)]
    pub product_name: String,
    pub weave_type: String,
    pub category: String,
    #[serde(default)]
    pub gender: String,
    pub composition: String,
}

/// A required input field, named in missing-field failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    StyleNo,
    WeaveType,
    Category,
    Composition,
}

impl RequiredField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StyleNo => "style_no",
            Self::WeaveType => "weave_type",
            Self::Category => "category",
            Self::Composition => "composition",
        }
    }
}

/// Closed taxonomy of row-level failures. Callers branch on the
/// variant; the string form is only for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    RequiredFieldMissing(RequiredField),
    UnsupportedWeaveType,
    CategoryNotRegistered,
    CategoryAmbiguous(Vec<String>),
    InvalidGenderValue,
    CompositionUnparseable,
    UnregisteredFiber,
    NoMatchingRule,
    /// Unexpected internal error (malformed reference data), caught
    /// at the row boundary with the underlying message.
    Processing(String),
}

impl FailureReason {
    /// Stable machine-readable tag for each failure kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RequiredFieldMissing(_) => "required-field-missing",
            Self::UnsupportedWeaveType => "unsupported-weave-type",
            Self::CategoryNotRegistered => "category-not-registered",
            Self::CategoryAmbiguous(_) => "category-ambiguous",
            Self::InvalidGenderValue => "invalid-gender-value",
            Self::CompositionUnparseable => "composition-unparseable",
            Self::UnregisteredFiber => "composition-has-unregistered-fiber",
            Self::NoMatchingRule => "no-matching-rule",
            Self::Processing(_) => "processing-error",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequiredFieldMissing(field) => {
                write!(f, "{} ({})", self.tag(), field.as_str())
            }
            Self::CategoryAmbiguous(candidates) => {
                write!(f, "{} ({})", self.tag(), candidates.join(", "))
            }
            Self::Processing(message) => write!(f, "{} ({message})", self.tag()),
            _ => f.write_str(self.tag()),
        }
    }
}

/// Terminal state of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowStatus {
    Classified,
    Failed(FailureReason),
}

/// Outcome record for one row. Owned by the caller after return and
/// never mutated by the pipeline again.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// Zero-based index of the row within the input batch.
    pub row: usize,
    /// Echoed input fields.
    pub input: RowInput,
    /// Resolved tariff code; `None` maps to the
    /// [`UNKNOWN_HS_CODE`] sentinel at the output boundary.
    pub hs_code: Option<String>,
    pub status: RowStatus,
}

impl RowOutcome {
    /// The tariff code with the `unknown` sentinel applied.
    pub fn hs_code_or_unknown(&self) -> &str {
        self.hs_code.as_deref().unwrap_or(UNKNOWN_HS_CODE)
    }
}

fn require(value: &str, field: RequiredField) -> Result<(), FailureReason> {
    if value.trim().is_empty() {
        Err(FailureReason::RequiredFieldMissing(field))
    } else {
        Ok(())
    }
}

fn classify_inner(tables: &ReferenceTables, input: &RowInput) -> Result<String, FailureReason> {
    require(&input.style_no, RequiredField::StyleNo)?;
    require(&input.weave_type, RequiredField::WeaveType)?;
    require(&input.category, RequiredField::Category)?;
    require(&input.composition, RequiredField::Composition)?;

    let weave =
        WeaveType::parse(&input.weave_type).ok_or(FailureReason::UnsupportedWeaveType)?;

    let category = match tables.catalog.resolve(&input.category) {
        CategoryMatch::Unique(name) => name,
        CategoryMatch::NotFound => return Err(FailureReason::CategoryNotRegistered),
        CategoryMatch::Ambiguous(candidates) => {
            return Err(FailureReason::CategoryAmbiguous(candidates))
        }
    };

    // Blank gender defaults to women; a present but unrecognized
    // value is an error, not a default.
    let gender = match input.gender.trim() {
        "" => Gender::Women,
        raw => Gender::parse(raw).ok_or(FailureReason::InvalidGenderValue)?,
    };

    let composition = match parse_composition(&input.composition, &tables.registry) {
        ParseOutcome::Parsed(composition) => composition,
        ParseOutcome::NoPairs => return Err(FailureReason::CompositionUnparseable),
        ParseOutcome::Unregistered => return Err(FailureReason::UnregisteredFiber),
    };

    let (major, minor) = match tables.registry.dominant_categories(&composition) {
        Ok(Some(pair)) => pair,
        Ok(None) => return Err(FailureReason::CompositionUnparseable),
        Err(err) => return Err(FailureReason::Processing(format!("{err:#}"))),
    };

    tables
        .rules
        .resolve(weave, &category, gender, &major, &minor)
        .map(str::to_string)
        .ok_or(FailureReason::NoMatchingRule)
}

/// Classify a single row. Every failure mode becomes a typed outcome;
/// this function never panics past its boundary on row data.
pub fn classify_row(tables: &ReferenceTables, row: usize, input: &RowInput) -> RowOutcome {
    match classify_inner(tables, input) {
        Ok(hs_code) => RowOutcome {
            row,
            input: input.clone(),
            hs_code: Some(hs_code),
            status: RowStatus::Classified,
        },
        Err(reason) => {
            tracing::debug!(row, style_no = %input.style_no, reason = %reason, "row failed");
            RowOutcome {
                row,
                input: input.clone(),
                hs_code: None,
                status: RowStatus::Failed(reason),
            }
        }
    }
}

/// Classify a batch in parallel across the rayon thread pool.
///
/// Output length always equals input length and outcomes are sorted
/// back into input order regardless of completion order.
pub fn classify_rows(tables: &ReferenceTables, rows: &[RowInput]) -> Vec<RowOutcome> {
    let mut outcomes: Vec<RowOutcome> = rows
        .par_iter()
        .enumerate()
        .map(|(row, input)| classify_row(tables, row, input))
        .collect();
    outcomes.sort_by_key(|outcome| outcome.row);

    let classified = outcomes
        .iter()
        .filter(|o| o.status == RowStatus::Classified)
        .count();
    tracing::info!(
        rows = rows.len(),
        classified,
        failed = rows.len() - classified,
        "batch classified"
    );
    outcomes
}

/// Single-threaded variant of [`classify_rows`], for callers that
/// want to avoid the thread pool.
pub fn classify_rows_serial(tables: &ReferenceTables, rows: &[RowInput]) -> Vec<RowOutcome> {
    rows.iter()
        .enumerate()
        .map(|(row, input)| classify_row(tables, row, input))
        .collect()
}

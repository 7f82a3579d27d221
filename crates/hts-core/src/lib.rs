//! hts-core: garment HS tariff classification
//!
//! This crate turns free-text garment spreadsheet fields into tariff
//! (HS) codes:
//! - Composition-string cleanup and (fiber, percentage) extraction
//! - Closed-world validation against a fiber registry
//! - Dominant major/minor fiber-category aggregation
//! - Free-text category resolution against a keyword catalog
//! - Rule-table resolution with `any` wildcards and other-bucket
//!   fallbacks
//! - A per-row pipeline that reports every failure as a typed outcome
//!
//! The crate performs no file or network I/O: callers load the
//! reference tables and rows, and own the outcomes that come back.

pub mod catalog;
pub mod composition;
pub mod extract;
pub mod labels;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod rules;

// Re-exports
pub use catalog::{CategoryCatalog, CategoryDefinition, CategoryMatch};
pub use composition::{parse_composition, Composition, ParseOutcome};
pub use extract::{merged_pairs, segment_pairs, SegmentScan};
pub use labels::{MAIN_LABELS, SECONDARY_PARTS};
pub use normalize::normalize_composition;
pub use pipeline::{
    classify_row, classify_rows, classify_rows_serial, FailureReason, ReferenceTables,
    RequiredField, RowInput, RowOutcome, RowStatus, UNKNOWN_HS_CODE,
};
pub use registry::{FiberEntry, FiberRegistry};
pub use rules::{Gender, GenderField, HsRule, HsRuleRecord, RuleField, RuleTable, WeaveType};

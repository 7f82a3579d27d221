//! HS rule table and tariff-code resolution.
//!
//! A rule keys on (weave type, standard category, gender, major fiber
//! category, minor fiber category) and yields a tariff code. Category
//! and fiber fields support an `any` wildcard, represented as a tagged
//! variant rather than a magic string so the matching logic stays
//! exhaustive.
//!
//! Resolution runs three decreasing-specificity passes: exact
//! major/minor first, then minor relaxed to `other`, then both major
//! and minor relaxed to `other`. A pass that matches ends the search —
//! a minor-level fallback hit never falls through to the major-level
//! pass. Within a pass the first rule in table order wins.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Fabric construction method. Anything else is unsupported and
/// rejected before rule resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaveType {
    Knit,
    Woven,
    Leather,
}

impl WeaveType {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "knit" => Some(Self::Knit),
            "woven" => Some(Self::Woven),
            "leather" => Some(Self::Leather),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knit => "knit",
            Self::Woven => "woven",
            Self::Leather => "leather",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Men,
    Women,
}

impl Gender {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "men" => Some(Self::Men),
            "women" => Some(Self::Women),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
        }
    }
}

/// A rule field that is either a concrete value or the `any` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleField {
    Any,
    Exact(String),
}

impl RuleField {
    /// Parse from reference data; values are stored lowercased.
    pub fn from_raw(text: &str) -> Self {
        let value = text.trim().to_lowercase();
        if value == "any" {
            Self::Any
        } else {
            Self::Exact(value)
        }
    }

    /// Does this field accept the given (lowercased) input value?
    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == value,
        }
    }

    /// Fallback-pass eligibility: the literal `other` bucket, or the
    /// wildcard which accepts anything including `other`.
    fn is_other_or_any(&self) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => expected == "other",
        }
    }
}

/// Gender field of a rule: a concrete gender or the `any` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderField {
    Any,
    Exact(Gender),
}

impl GenderField {
    fn matches(&self, gender: Gender) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => *expected == gender,
        }
    }
}

/// One classification rule.
#[derive(Debug, Clone)]
pub struct HsRule {
    pub weave: WeaveType,
    pub category: RuleField,
    pub gender: GenderField,
    pub major: RuleField,
    pub minor: RuleField,
    pub hs_code: String,
    pub active: bool,
}

/// Raw all-strings rule row, as stored in reference files. Converted
/// fallibly into [`HsRule`]; malformed rows are fatal load errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HsRuleRecord {
    pub weave_type: String,
    pub category: String,
    pub gender: String,
    pub major: String,
    pub minor: String,
    pub hs_code: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TryFrom<HsRuleRecord> for HsRule {
    type Error = anyhow::Error;

    fn try_from(record: HsRuleRecord) -> Result<Self> {
        let Some(weave) = WeaveType::parse(&record.weave_type) else {
            bail!("rule has unsupported weave type {:?}", record.weave_type);
        };
        let gender = match record.gender.trim().to_lowercase().as_str() {
            "any" => GenderField::Any,
            other => match Gender::parse(other) {
                Some(gender) => GenderField::Exact(gender),
                None => bail!("rule has invalid gender {:?}", record.gender),
            },
        };
        if record.hs_code.trim().is_empty() {
            bail!("rule has an empty hs_code");
        }
        Ok(HsRule {
            weave,
            category: RuleField::from_raw(&record.category),
            gender,
            major: RuleField::from_raw(&record.major),
            minor: RuleField::from_raw(&record.minor),
            hs_code: record.hs_code.trim().to_string(),
            active: record.active,
        })
    }
}

/// Read-only ordered rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<HsRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<HsRule>) -> Self {
        Self { rules }
    }

    /// Build from raw records, failing on the first malformed row.
    pub fn from_records(records: Vec<HsRuleRecord>) -> Result<Self> {
        let rules = records
            .into_iter()
            .map(HsRule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the tariff code for a fully-resolved request.
    ///
    /// `category`, `major` and `minor` are compared lowercased. The
    /// three passes relax minor, then major, to the `other` bucket;
    /// the first pass with any hit decides the result.
    pub fn resolve(
        &self,
        weave: WeaveType,
        category: &str,
        gender: Gender,
        major: &str,
        minor: &str,
    ) -> Option<&str> {
        let category = category.trim().to_lowercase();
        let major = major.trim().to_lowercase();
        let minor = minor.trim().to_lowercase();

        let base = |rule: &HsRule| {
            rule.active
                && rule.weave == weave
                && rule.category.matches(&category)
                && rule.gender.matches(gender)
        };

        self.rules
            .iter()
            .find(|rule| base(rule) && rule.major.matches(&major) && rule.minor.matches(&minor))
            .or_else(|| {
                self.rules.iter().find(|rule| {
                    base(rule) && rule.major.matches(&major) && rule.minor.is_other_or_any()
                })
            })
            .or_else(|| {
                self.rules.iter().find(|rule| {
                    base(rule) && rule.major.is_other_or_any() && rule.minor.is_other_or_any()
                })
            })
            .map(|rule| rule.hs_code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(
        weave: WeaveType,
        category: &str,
        gender: &str,
        major: &str,
        minor: &str,
        hs_code: &str,
    ) -> HsRule {
        HsRule::try_from(HsRuleRecord {
            weave_type: weave.as_str().to_string(),
            category: category.to_string(),
            gender: gender.to_string(),
            major: major.to_string(),
            minor: minor.to_string(),
            hs_code: hs_code.to_string(),
            active: true,
        })
        .unwrap()
    }

    #[test]
    fn test_exact_match_preferred() {
        let table = RuleTable::new(vec![
            rule(WeaveType::Knit, "tshirts", "men", "cotton", "other", "6109.10.0027"),
            rule(WeaveType::Knit, "tshirts", "men", "cotton", "cotton", "6109.10.0004"),
        ]);
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Men, "cotton", "cotton"),
            Some("6109.10.0004")
        );
    }

    #[test]
    fn test_minor_fallback_before_major_fallback() {
        let table = RuleTable::new(vec![
            rule(WeaveType::Knit, "tshirts", "men", "other", "other", "9999.99.9999"),
            rule(WeaveType::Knit, "tshirts", "men", "cotton", "other", "6109.10.0027"),
        ]);
        // No (cotton, cotton) rule: must land on the minor-level
        // fallback, never on the major-level one.
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Men, "cotton", "cotton"),
            Some("6109.10.0027")
        );
    }

    #[test]
    fn test_major_fallback_last() {
        let table = RuleTable::new(vec![rule(
            WeaveType::Knit,
            "tshirts",
            "men",
            "other",
            "other",
            "6109.90.1047",
        )]);
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Men, "wool", "wool"),
            Some("6109.90.1047")
        );
    }

    #[test]
    fn test_wildcard_fields() {
        let table = RuleTable::new(vec![rule(
            WeaveType::Woven,
            "any",
            "any",
            "any",
            "any",
            "6204.00.0000",
        )]);
        assert_eq!(
            table.resolve(WeaveType::Woven, "skirts", Gender::Women, "silk", "silk"),
            Some("6204.00.0000")
        );
        assert_eq!(
            table.resolve(WeaveType::Knit, "skirts", Gender::Women, "silk", "silk"),
            None
        );
    }

    #[test]
    fn test_gender_must_match() {
        let table = RuleTable::new(vec![rule(
            WeaveType::Knit,
            "tshirts",
            "men",
            "cotton",
            "cotton",
            "6109.10.0004",
        )]);
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Women, "cotton", "cotton"),
            None
        );
    }

    #[test]
    fn test_inactive_rules_skipped() {
        let mut inactive = rule(
            WeaveType::Knit,
            "tshirts",
            "men",
            "cotton",
            "cotton",
            "6109.10.0004",
        );
        inactive.active = false;
        let table = RuleTable::new(vec![inactive]);
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Men, "cotton", "cotton"),
            None
        );
    }

    #[test]
    fn test_first_rule_wins_within_pass() {
        let table = RuleTable::new(vec![
            rule(WeaveType::Knit, "tshirts", "any", "cotton", "cotton", "first"),
            rule(WeaveType::Knit, "tshirts", "any", "cotton", "cotton", "second"),
        ]);
        assert_eq!(
            table.resolve(WeaveType::Knit, "tshirts", Gender::Women, "cotton", "cotton"),
            Some("first")
        );
    }

    #[test]
    fn test_leather_weave_supported() {
        let table = RuleTable::new(vec![rule(
            WeaveType::Leather,
            "jackets",
            "any",
            "any",
            "any",
            "4203.10.4030",
        )]);
        assert_eq!(
            table.resolve(WeaveType::Leather, "jackets", Gender::Men, "leather", "leather"),
            Some("4203.10.4030")
        );
    }

    #[test]
    fn test_record_conversion_errors() {
        let record = HsRuleRecord {
            weave_type: "crochet".to_string(),
            category: "any".to_string(),
            gender: "any".to_string(),
            major: "any".to_string(),
            minor: "any".to_string(),
            hs_code: "1".to_string(),
            active: true,
        };
        assert!(HsRule::try_from(record).is_err());

        let record = HsRuleRecord {
            weave_type: "knit".to_string(),
            category: "any".to_string(),
            gender: "unisex".to_string(),
            major: "any".to_string(),
            minor: "any".to_string(),
            hs_code: "1".to_string(),
            active: true,
        };
        assert!(HsRule::try_from(record).is_err());
    }

    #[test]
    fn test_weave_and_gender_parsing() {
        assert_eq!(WeaveType::parse(" Knit "), Some(WeaveType::Knit));
        assert_eq!(WeaveType::parse("LEATHER"), Some(WeaveType::Leather));
        assert_eq!(WeaveType::parse("felt"), None);
        assert_eq!(Gender::parse("WOMEN"), Some(Gender::Women));
        assert_eq!(Gender::parse(""), None);
    }
}

//! Reference-table loading.
//!
//! The fiber registry, category catalog and rule table are loaded
//! once, before any row is classified. Any error here is fatal to the
//! whole batch: a missing file, malformed JSON, a duplicate fiber
//! name or an invalid rule row all abort up front.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use hts_core::{
    CategoryCatalog, CategoryDefinition, FiberEntry, FiberRegistry, HsRuleRecord, ReferenceTables,
    RuleTable,
};

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load and validate all three reference tables.
pub fn load_tables(fibers: &Path, categories: &Path, rules: &Path) -> Result<ReferenceTables> {
    let entries: Vec<FiberEntry> = read_json(fibers)?;
    let registry = FiberRegistry::new(entries)
        .with_context(|| format!("Invalid fiber registry in {}", fibers.display()))?;

    let definitions: Vec<CategoryDefinition> = read_json(categories)?;
    let catalog = CategoryCatalog::new(definitions);

    let records: Vec<HsRuleRecord> = read_json(rules)?;
    let rules_table = RuleTable::from_records(records)
        .with_context(|| format!("Invalid rule table in {}", rules.display()))?;

    if registry.is_empty() {
        tracing::warn!("fiber registry is empty; every composition will fail validation");
    }
    if catalog.is_empty() {
        tracing::warn!("category catalog is empty; every category will be unregistered");
    }
    if rules_table.is_empty() {
        tracing::warn!("rule table is empty; no row can be classified");
    }
    tracing::info!(
        fibers = registry.len(),
        categories = catalog.len(),
        rules = rules_table.len(),
        "reference tables loaded"
    );

    Ok(ReferenceTables {
        registry,
        catalog,
        rules: rules_table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const FIBERS: &str = r#"[
        {"name": "Cotton", "major_code": "cotton", "major_name": "Cotton",
         "minor_code": "cotton", "minor_name": "Cotton"}
    ]"#;
    const CATEGORIES: &str = r#"[
        {"code": "C01", "name": "Tshirts", "keywords": ["tee"]}
    ]"#;
    const RULES: &str = r#"[
        {"weave_type": "knit", "category": "tshirts", "gender": "any",
         "major": "cotton", "minor": "cotton", "hs_code": "6109.10.0004"}
    ]"#;

    #[test]
    fn test_load_tables() {
        let dir = tempfile::tempdir().unwrap();
        let fibers = write_file(dir.path(), "fibers.json", FIBERS);
        let categories = write_file(dir.path(), "categories.json", CATEGORIES);
        let rules = write_file(dir.path(), "rules.json", RULES);

        let tables = load_tables(&fibers, &categories, &rules).unwrap();
        assert_eq!(tables.registry.len(), 1);
        assert_eq!(tables.catalog.len(), 1);
        assert_eq!(tables.rules.len(), 1);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let categories = write_file(dir.path(), "categories.json", CATEGORIES);
        let rules = write_file(dir.path(), "rules.json", RULES);
        assert!(load_tables(&dir.path().join("missing.json"), &categories, &rules).is_err());
    }

    #[test]
    fn test_duplicate_fiber_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fibers = write_file(
            dir.path(),
            "fibers.json",
            r#"[
                {"name": "Cotton", "major_code": "cotton", "major_name": "Cotton",
                 "minor_code": "cotton", "minor_name": "Cotton"},
                {"name": "COTTON", "major_code": "cotton", "major_name": "Cotton",
                 "minor_code": "cotton", "minor_name": "Cotton"}
            ]"#,
        );
        let categories = write_file(dir.path(), "categories.json", CATEGORIES);
        let rules = write_file(dir.path(), "rules.json", RULES);
        assert!(load_tables(&fibers, &categories, &rules).is_err());
    }

    #[test]
    fn test_bad_rule_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let fibers = write_file(dir.path(), "fibers.json", FIBERS);
        let categories = write_file(dir.path(), "categories.json", CATEGORIES);
        let rules = write_file(
            dir.path(),
            "rules.json",
            r#"[
                {"weave_type": "crochet", "category": "any", "gender": "any",
                 "major": "any", "minor": "any", "hs_code": "1"}
            ]"#,
        );
        assert!(load_tables(&fibers, &categories, &rules).is_err());
    }
}

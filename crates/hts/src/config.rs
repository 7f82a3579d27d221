//! Configuration loading for the hts CLI.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    pub tables: Option<TablesConfig>,
    pub runtime: Option<RuntimeConfig>,
}

/// Default locations of the reference-table files; command-line flags
/// override these.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct TablesConfig {
    pub fibers: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub rules: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuntimeConfig {
    /// Classify rows single-threaded instead of on the rayon pool.
    pub serial: Option<bool>,
}

/// Config file looked up in the working directory when `--config` is
/// not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("hts.toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

impl Config {
    pub fn fibers_path(&self) -> Option<PathBuf> {
        self.tables.as_ref().and_then(|t| t.fibers.clone())
    }

    pub fn categories_path(&self) -> Option<PathBuf> {
        self.tables.as_ref().and_then(|t| t.categories.clone())
    }

    pub fn rules_path(&self) -> Option<PathBuf> {
        self.tables.as_ref().and_then(|t| t.rules.clone())
    }

    pub fn serial(&self) -> bool {
        self.runtime
            .as_ref()
            .and_then(|r| r.serial)
            .unwrap_or(false)
    }
}

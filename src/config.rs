// ABOUTME: Run configuration for a duplication: store paths, table order, and options
// ABOUTME: Loads overrides from a TOML file on top of the built-in defaults

use crate::migration::{CopyOptions, DEFAULT_TABLES};
use crate::utils::validate_table_name;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_PATH: &str = "db000.sqlite";
pub const DEFAULT_DESTINATION_PATH: &str = "db111.sqlite";

/// Everything a duplication run needs to know
///
/// `Default` reproduces the fixed run: `db000.sqlite` copied into
/// `db111.sqlite`, tables in [`DEFAULT_TABLES`] order, foreign keys not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DuplicatorConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Tables to copy, in order. Referenced tables must come first.
    pub tables: Vec<String>,
    pub enforce_foreign_keys: bool,
    pub fail_on_empty_table: bool,
    /// Compare table checksums after copying
    pub verify: bool,
}

impl Default for DuplicatorConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE_PATH),
            destination: PathBuf::from(DEFAULT_DESTINATION_PATH),
            tables: DEFAULT_TABLES.iter().map(|t| t.to_string()).collect(),
            enforce_foreign_keys: false,
            fail_on_empty_table: false,
            verify: false,
        }
    }
}

impl DuplicatorConfig {
    /// Check the configuration before any store is touched
    ///
    /// # Errors
    ///
    /// - The table list is empty or names a table twice
    /// - A table name is not a plain identifier
    /// - Source and destination are the same path
    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            bail!("No tables configured for copying");
        }

        let mut seen = HashSet::new();
        for table in &self.tables {
            validate_table_name(table)?;
            if !seen.insert(table.to_ascii_lowercase()) {
                bail!("Table '{}' is listed more than once", table);
            }
        }

        if self.source == self.destination {
            bail!(
                "Source and destination must be different files (both are '{}')",
                self.source.display()
            );
        }

        Ok(())
    }

    pub fn copy_options(&self) -> CopyOptions {
        CopyOptions {
            fail_on_empty_table: self.fail_on_empty_table,
        }
    }
}

/// Parse a configuration from TOML text; missing keys keep their defaults
///
/// # Examples
///
/// ```
/// # use commodity_db_duplicator::config::parse_config;
/// let config = parse_config(r#"
///     source = "old.sqlite"
///     tables = ["CImage"]
/// "#).unwrap();
///
/// assert_eq!(config.source.to_str(), Some("old.sqlite"));
/// assert_eq!(config.destination.to_str(), Some("db111.sqlite"));
/// assert_eq!(config.tables, vec!["CImage"]);
/// ```
pub fn parse_config(contents: &str) -> Result<DuplicatorConfig> {
    toml::from_str(contents).context("Failed to parse duplicator configuration")
}

/// Load a configuration file
pub fn load_config_from_file(path: impl AsRef<Path>) -> Result<DuplicatorConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config(&contents).with_context(|| format!("Invalid config file '{}'", path.display()))
}

//! Table configuration, loadable from TOML.
//!
//! ```toml
//! num_rows = 100
//! num_cols = 26
//! max_num_rows = 1000   # -1 = unbounded
//! history_limit = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TableError};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    pub num_rows: usize,
    pub num_cols: usize,
    pub min_num_rows: usize,
    /// -1 means unbounded.
    pub max_num_rows: i64,
    pub min_num_cols: usize,
    /// -1 means unbounded.
    pub max_num_cols: i64,
    /// Number of undoable operations kept.
    pub history_limit: usize,
    pub header_height: u32,
    pub header_width: u32,
    /// Matched against `#<sheet>!` prefixes in id references.
    pub sheet_id: Option<String>,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            num_rows: 50,
            num_cols: 26,
            min_num_rows: 1,
            max_num_rows: -1,
            min_num_cols: 1,
            max_num_cols: -1,
            history_limit: 10,
            header_height: 24,
            header_width: 50,
            sheet_id: None,
        }
    }
}

fn bound(value: i64, name: &str) -> Result<Option<usize>> {
    match value {
        -1 => Ok(None),
        n if n >= 0 => Ok(Some(n as usize)),
        n => Err(TableError::Config(format!("{} must be -1 or >= 0, got {}", name, n))),
    }
}

impl TableConfig {
    pub fn from_toml_str(content: &str) -> Result<TableConfig> {
        let config: TableConfig =
            toml::from_str(content).map_err(|e| TableError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<TableConfig> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(TableError::Config(format!(
                "refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn max_rows(&self) -> Option<usize> {
        bound(self.max_num_rows, "max_num_rows").ok().flatten()
    }

    pub fn max_cols(&self) -> Option<usize> {
        bound(self.max_num_cols, "max_num_cols").ok().flatten()
    }

    /// Check that the bounds are consistent with each other.
    pub fn validate(&self) -> Result<()> {
        let max_rows = bound(self.max_num_rows, "max_num_rows")?;
        let max_cols = bound(self.max_num_cols, "max_num_cols")?;
        if max_rows.is_some_and(|max| max < self.min_num_rows) {
            return Err(TableError::Config(
                "max_num_rows is below min_num_rows".to_string(),
            ));
        }
        if max_cols.is_some_and(|max| max < self.min_num_cols) {
            return Err(TableError::Config(
                "max_num_cols is below min_num_cols".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = TableConfig::from_toml_str("num_rows = 5\nmax_num_cols = 8\n").unwrap();
        assert_eq!(config.num_rows, 5);
        assert_eq!(config.num_cols, 26);
        assert_eq!(config.history_limit, 10);
        assert_eq!(config.max_rows(), None);
        assert_eq!(config.max_cols(), Some(8));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(TableConfig::from_toml_str("max_num_rows = -5").is_err());
        assert!(TableConfig::from_toml_str("min_num_cols = 4\nmax_num_cols = 2").is_err());
        assert!(TableConfig::from_toml_str("colour = \"red\"").is_err());
    }
}

//! Run configuration.
//!
//! Values are resolved once per invocation, highest priority first:
//! CLI flag (or its environment variable), `--config` TOML file, default.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SCHEMA: &str = "main";
pub const DEFAULT_TABLE: &str = "file_transfer_tracker";
pub const DEFAULT_LEDGER_FILE: &str = "ledger.duckdb";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid {field} name '{value}': expected letters, digits and underscores")]
    InvalidIdentifier { field: &'static str, value: String },
}

/// Where checkpoint records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// DuckDB database file
    pub path: PathBuf,
    pub schema: String,
    pub table: String,
}

impl LedgerConfig {
    /// Defaults rooted at `home` (normally `$DATESYNC_HOME`).
    pub fn default_in(home: &Path) -> Self {
        Self {
            path: home.join(DEFAULT_LEDGER_FILE),
            schema: DEFAULT_SCHEMA.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("schema", &self.schema)?;
        validate_identifier("table", &self.table)?;
        Ok(())
    }

    /// `schema.table`, for display.
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Fully resolved configuration for a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub ledger: LedgerConfig,
}

/// Contents of a `--config` TOML file. Every key is optional.
///
/// ```toml
/// source = "/mnt/exports"
/// target = "/mnt/landing"
///
/// [ledger]
/// path = "/var/lib/datesync/ledger.duckdb"
/// schema = "tracking"
/// table = "file_transfer_tracker"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    #[serde(default)]
    pub ledger: FileLedgerConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLedgerConfig {
    pub path: Option<PathBuf>,
    pub schema: Option<String>,
    pub table: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line (clap already folds in env vars).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<PathBuf>,
    pub target: Option<PathBuf>,
    pub ledger_path: Option<PathBuf>,
    pub schema: Option<String>,
}

impl ConfigOverrides {
    /// Ledger settings only. Used by commands that never touch the trees.
    pub fn resolve_ledger(&self, file: &FileConfig, home: &Path) -> Result<LedgerConfig, ConfigError> {
        let defaults = LedgerConfig::default_in(home);
        let ledger = LedgerConfig {
            path: self
                .ledger_path
                .clone()
                .or_else(|| file.ledger.path.clone())
                .unwrap_or(defaults.path),
            schema: self
                .schema
                .clone()
                .or_else(|| file.ledger.schema.clone())
                .unwrap_or(defaults.schema),
            table: file.ledger.table.clone().unwrap_or(defaults.table),
        };
        ledger.validate()?;
        Ok(ledger)
    }

    pub fn resolve(&self, file: &FileConfig, home: &Path) -> Result<SyncConfig, ConfigError> {
        let source_root = self
            .source
            .clone()
            .or_else(|| file.source.clone())
            .ok_or(ConfigError::Missing("source"))?;
        let target_root = self
            .target
            .clone()
            .or_else(|| file.target.clone())
            .ok_or(ConfigError::Missing("target"))?;

        Ok(SyncConfig {
            source_root,
            target_root,
            ledger: self.resolve_ledger(file, home)?,
        })
    }
}

/// Schema and table names are spliced into SQL, so only plain identifiers pass.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_beats_file_beats_default() {
        let file = FileConfig {
            source: Some(PathBuf::from("/file/src")),
            target: Some(PathBuf::from("/file/dst")),
            ledger: FileLedgerConfig {
                path: None,
                schema: Some("tracking".to_string()),
                table: None,
            },
        };
        let overrides = ConfigOverrides {
            source: Some(PathBuf::from("/cli/src")),
            ..Default::default()
        };

        let config = overrides.resolve(&file, Path::new("/home/op/.datesync")).unwrap();
        assert_eq!(config.source_root, PathBuf::from("/cli/src"));
        assert_eq!(config.target_root, PathBuf::from("/file/dst"));
        assert_eq!(config.ledger.path, PathBuf::from("/home/op/.datesync/ledger.duckdb"));
        assert_eq!(config.ledger.schema, "tracking");
        assert_eq!(config.ledger.table, DEFAULT_TABLE);
        assert_eq!(config.ledger.qualified_table(), "tracking.file_transfer_tracker");
    }

    #[test]
    fn missing_target_is_an_error() {
        let overrides = ConfigOverrides {
            source: Some(PathBuf::from("/src")),
            ..Default::default()
        };
        let err = overrides
            .resolve(&FileConfig::default(), Path::new("/tmp"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("target")));
    }

    #[test]
    fn identifiers_are_validated() {
        assert!(validate_identifier("schema", "main").is_ok());
        assert!(validate_identifier("table", "_tracker_2").is_ok());
        assert!(validate_identifier("table", "2tracker").is_err());
        assert!(validate_identifier("table", "t; DROP TABLE x").is_err());
        assert!(validate_identifier("schema", "").is_err());

        let overrides = ConfigOverrides {
            schema: Some("bad-name".to_string()),
            ..Default::default()
        };
        let err = overrides
            .resolve_ledger(&FileConfig::default(), Path::new("/tmp"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIdentifier { field: "schema", .. }));
    }

    #[test]
    fn toml_file_parses_and_rejects_unknown_keys() {
        let path = Path::new("datesync.toml");
        let file = FileConfig::parse(
            path,
            r#"
source = "/mnt/exports"
target = "/mnt/landing"

[ledger]
path = "/var/lib/datesync/ledger.duckdb"
table = "tracker"
"#,
        )
        .unwrap();
        assert_eq!(file.source, Some(PathBuf::from("/mnt/exports")));
        assert_eq!(file.ledger.table.as_deref(), Some("tracker"));
        assert_eq!(file.ledger.schema, None);

        let err = FileConfig::parse(path, "sorce = \"/typo\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

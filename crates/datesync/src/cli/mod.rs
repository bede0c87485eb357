//! CLI command implementations

pub mod config;
pub mod error;
pub mod history;
pub mod output;
pub mod reset;
pub mod run;

use anyhow::Result;
use clap::Args;
use datesync::checkpoint::DuckDbLedger;
use datesync::config::{ConfigOverrides, FileConfig, LedgerConfig};
use std::path::{Path, PathBuf};

use error::HelpfulError;

/// Ledger location flags shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct LedgerArgs {
    /// DuckDB ledger file (default: $DATESYNC_HOME/ledger.duckdb)
    #[arg(long, env = "DATESYNC_LEDGER")]
    pub ledger: Option<PathBuf>,

    /// Schema holding the ledger table
    #[arg(long, env = "DATESYNC_LEDGER_SCHEMA")]
    pub schema: Option<String>,
}

impl LedgerArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            ledger_path: self.ledger.clone(),
            schema: self.schema.clone(),
            ..Default::default()
        }
    }
}

/// `--config` file contents, or all-defaults when no file was given.
pub fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::load(path).map_err(|e| HelpfulError::from_config(&e).into()),
        None => Ok(FileConfig::default()),
    }
}

pub fn resolve_ledger(args: &LedgerArgs, file: &FileConfig) -> Result<LedgerConfig> {
    args.overrides()
        .resolve_ledger(file, &datesync_logging::datesync_home())
        .map_err(|e| HelpfulError::from_config(&e).into())
}

/// Read-only handle for reporting commands.
pub fn open_ledger_readonly(config: &LedgerConfig) -> Result<DuckDbLedger> {
    if !config.path.exists() {
        return Err(HelpfulError::ledger_not_found(&config.path).into());
    }
    DuckDbLedger::open_readonly(config)
        .map_err(|e| HelpfulError::from_ledger(&e, &config.path).into())
}

//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use datesync::checkpoint::LedgerError;
use datesync::config::ConfigError;
use datesync::sync::{SimulationDate, SyncError};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug, Serialize)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions
            .extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Override date is not a `YYYY-MM-DD` calendar date
    pub fn invalid_date(value: &str) -> Self {
        Self::new(format!("Invalid simulation date: '{}'", value))
            .with_context("Dates must be real calendar dates written as YYYY-MM-DD")
            .with_suggestions([
                "TRY: Use zero-padded digits, e.g. --date 2024-01-05".to_string(),
                "TRY: Omit --date to process the next unprocessed date".to_string(),
            ])
    }

    /// Another process holds the ledger lock
    pub fn ledger_locked(path: &Path) -> Self {
        Self::new(format!("Ledger is in use: {}", path.display()))
            .with_context("Another datesync process holds the ledger lock; runs must not overlap")
            .with_suggestions([
                "TRY: Wait for the running sync to finish, then retry".to_string(),
                format!(
                    "TRY: Check the lock owner: cat {}.lock.json",
                    path.display()
                ),
            ])
    }

    /// Ledger file does not exist yet
    pub fn ledger_not_found(path: &Path) -> Self {
        Self::new(format!("Ledger not found: {}", path.display()))
            .with_context("No sync run has written to this ledger yet")
            .with_suggestions([
                "TRY: Run a sync first: datesync run --source <dir> --target <dir>".to_string(),
                "TRY: Point at an existing ledger with --ledger <path>".to_string(),
            ])
    }

    /// Date was already processed
    pub fn already_recorded(date: SimulationDate) -> Self {
        Self::new(format!("Simulation date {} has already been processed", date))
            .with_context("Each date is recorded once; re-running it needs an explicit reset")
            .with_suggestions([
                format!("TRY: Reset it first: datesync reset --date {}", date),
                "TRY: Inspect recent runs: datesync history".to_string(),
            ])
    }

    /// Source root could not be listed
    pub fn source_unreadable(root: &Path, reason: &str) -> Self {
        Self::new(format!("Cannot list source root: {}", root.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", root.display()),
                "TRY: Verify you have read permissions for this path".to_string(),
            ])
    }

    /// Every matched file failed to copy
    pub fn run_failed(date: SimulationDate, failed: u64) -> Self {
        Self::new(format!(
            "No files transferred for {}: {} copy failure(s)",
            date, failed
        ))
        .with_context("The date is recorded with status 'failed'")
        .with_suggestions([
            "TRY: Fix the copy errors listed above".to_string(),
            format!(
                "TRY: Re-run the date: datesync reset --date {} && datesync run --date {}",
                date, date
            ),
        ])
    }

    pub fn from_config(err: &ConfigError) -> Self {
        let base = Self::new(err.to_string());
        match err {
            ConfigError::Missing(setting) => base
                .with_context(format!("No {} directory was configured", setting))
                .with_suggestions([
                    format!(
                        "TRY: Pass --{} <dir> or set DATESYNC_{}",
                        setting,
                        setting.to_uppercase()
                    ),
                    format!("TRY: Add `{} = \"...\"` to the --config file", setting),
                ]),
            ConfigError::InvalidIdentifier { .. } => base
                .with_context("Schema and table names are used directly in SQL")
                .with_suggestion("TRY: Use only letters, digits and underscores"),
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => base
                .with_suggestion(format!("TRY: Check the file: cat {}", path.display())),
        }
    }

    pub fn from_ledger(err: &LedgerError, path: &Path) -> Self {
        match err {
            LedgerError::Locked(_) => Self::ledger_locked(path),
            LedgerError::DuplicateDate(date) => Self::already_recorded(*date),
            other => Self::new(format!("Ledger error: {}", other))
                .with_context(format!("Ledger: {}", path.display())),
        }
    }

    pub fn from_sync(err: &SyncError, path: &Path) -> Self {
        match err {
            SyncError::Ledger(inner) => Self::from_ledger(inner, path),
            SyncError::AlreadyRecorded(date) => Self::already_recorded(*date),
            SyncError::InvalidDate(inner) => Self::invalid_date(&inner.0),
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// A failure whose details were already printed as part of the command's
/// output. Only the exit code is left to set.
#[derive(Debug)]
pub struct ReportedFailure(pub String);

impl fmt::Display for ReportedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ReportedFailure {}

/// Print an error as `{"error": {...}}` on stdout for `--json` callers.
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({ "error": helpful }),
        None => serde_json::json!({
            "error": {
                "message": format!("{:#}", err),
                "context": null,
                "suggestions": [],
            }
        }),
    };
    println!("{}", payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While processing data")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While processing data"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_invalid_date() {
        let display = HelpfulError::invalid_date("2024-1-5").to_string();
        assert!(display.contains("2024-1-5"));
        assert!(display.contains("YYYY-MM-DD"));
        assert!(display.contains("TRY:"));
    }

    #[test]
    fn test_missing_setting_names_flag_and_env() {
        let err = HelpfulError::from_config(&ConfigError::Missing("target"));
        let display = err.to_string();
        assert!(display.contains("--target"));
        assert!(display.contains("DATESYNC_TARGET"));
    }

    #[test]
    fn test_locked_ledger() {
        let path = PathBuf::from("/var/lib/datesync/ledger.duckdb");
        let err = HelpfulError::from_ledger(&LedgerError::Locked(path.clone()), &path);
        assert!(err.message.contains("in use"));
        assert!(err.to_string().contains("ledger.duckdb.lock.json"));
    }
}

//! Checkpoint ledger: one append-only record per processed simulation date.
//!
//! The ledger is the only persisted state. Every run reads the last recorded
//! date fresh and appends exactly one record when it makes progress.

mod duckdb;

pub use self::duckdb::{DuckDbLedger, DEFAULT_HISTORY_LIMIT};

use chrono::{DateTime, Utc};
use datesync_db::BackendError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::sync::{RunStatus, SimulationDate};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger database error: {0}")]
    Backend(#[from] BackendError),

    #[error("Simulation date {0} is already recorded in the ledger")]
    DuplicateDate(SimulationDate),

    #[error("Ledger {} is locked by another datesync process", .0.display())]
    Locked(PathBuf),

    #[error("Invalid checkpoint record: {0}")]
    InvalidRecord(String),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Aggregated counts for one processed date, as written to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateStats {
    pub total_folders_found: u32,
    pub folders_with_files: u32,
    pub folders_skipped: u32,
    pub total_files_transferred: u64,
    pub total_bytes_transferred: u64,
    pub status: RunStatus,
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointRecord {
    pub simulation_date: SimulationDate,
    pub total_folders_found: u32,
    pub folders_with_files: u32,
    pub folders_skipped: u32,
    pub total_files_transferred: u64,
    pub total_bytes_transferred: u64,
    pub last_updated: DateTime<Utc>,
    pub status: RunStatus,
}

impl CheckpointRecord {
    pub fn new(simulation_date: SimulationDate, stats: &DateStats, last_updated: DateTime<Utc>) -> Self {
        Self {
            simulation_date,
            total_folders_found: stats.total_folders_found,
            folders_with_files: stats.folders_with_files,
            folders_skipped: stats.folders_skipped,
            total_files_transferred: stats.total_files_transferred,
            total_bytes_transferred: stats.total_bytes_transferred,
            last_updated,
            status: stats.status,
        }
    }

    /// Bytes as MB rounded to two places, the unit history views show.
    pub fn megabytes(&self) -> f64 {
        (self.total_bytes_transferred as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
    }
}

/// Aggregate view over every recorded date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressOverview {
    pub dates_processed: u64,
    pub first_date: Option<SimulationDate>,
    pub latest_date: Option<SimulationDate>,
    pub total_files: u64,
    pub total_bytes: u64,
    pub avg_folders_with_files: Option<f64>,
    pub avg_folders_skipped: Option<f64>,
    pub successful_runs: u64,
    pub partial_runs: u64,
    pub failed_runs: u64,
}

/// The single read and single write the sync engine needs.
pub trait CheckpointLedger {
    /// Latest recorded date. Absent or unreadable ledgers mean "first run".
    fn last_date(&self) -> Option<SimulationDate>;

    fn contains(&self, date: SimulationDate) -> Result<bool, LedgerError>;

    /// Append one record. Fails with [`LedgerError::DuplicateDate`] if the
    /// date is already present.
    fn record(&self, date: SimulationDate, stats: &DateStats) -> Result<CheckpointRecord, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_round_to_two_places() {
        let stats = DateStats {
            total_folders_found: 1,
            folders_with_files: 1,
            folders_skipped: 0,
            total_files_transferred: 1,
            total_bytes_transferred: 1_572_864 + 5_000,
            status: RunStatus::Success,
        };
        let record = CheckpointRecord::new("2024-01-01".parse().unwrap(), &stats, Utc::now());
        assert_eq!(record.megabytes(), 1.5);
    }
}

use thiserror::Error;

use super::types::{InvalidDateError, SimulationDate};
use crate::checkpoint::LedgerError;

/// Run-level failures. Per-file and per-folder problems never surface here;
/// they are folded into the run's status and error list instead.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Simulation date {0} has already been processed; run `datesync reset --date {0}` to process it again")]
    AlreadyRecorded(SimulationDate),

    #[error(transparent)]
    InvalidDate(#[from] InvalidDateError),
}

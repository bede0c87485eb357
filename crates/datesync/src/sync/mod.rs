//! Incremental date synchronization.
//!
//! Folders under the source root are independent datasets whose entries
//! carry a `YYYY-MM-DD` date in their names. Each run picks one global
//! simulation date, copies whatever every folder holds for it, and records
//! the outcome in the checkpoint ledger.

mod dates;
mod engine;
mod error;
mod folders;
mod matcher;
mod sequencer;
mod summary;
mod transfer;
mod types;

pub use dates::{dated_entries, dates_in_listing, extract_dates};
pub use engine::{
    DateSummary, FolderDisposition, FolderResult, RunReport, SkipReason, SyncEngine,
};
pub use error::SyncError;
pub use folders::{scan_folders, ExportFolder};
pub use matcher::match_files;
pub use sequencer::{next_date, DateTimeline};
pub use summary::{render_report, render_summary, MAX_LISTED_ERRORS};
pub use transfer::transfer_files;
pub use types::{
    DatedEntry, DatedEntryKind, Discovered, InvalidDateError, MatchedFile, RunStatus,
    SimulationDate, TransferOutcome,
};

/// Parse a user-supplied override date before any work starts.
pub fn parse_override(value: Option<&str>) -> Result<Option<SimulationDate>, SyncError> {
    value
        .map(|v| v.parse::<SimulationDate>())
        .transpose()
        .map_err(SyncError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_parsing_is_strict() {
        assert_eq!(parse_override(None).unwrap(), None);
        assert_eq!(
            parse_override(Some("2024-05-05")).unwrap(),
            SimulationDate::from_ymd(2024, 5, 5)
        );
        assert!(matches!(
            parse_override(Some("05/05/2024")),
            Err(SyncError::InvalidDate(_))
        ));
    }
}

//! One sync invocation.
//!
//! ```text
//! DISCOVER -> SEQUENCE -> PROCESS_EACH_FOLDER -> AGGREGATE -> CHECKPOINT -> DONE
//!     |            |
//!     +------------+--> DONE (no folders / no next date)
//! ```
//!
//! Exactly one simulation date is handled per run, folders and files strictly
//! in order. The checkpoint is written last, so an interrupted run leaves no
//! record and the next run retries the same date.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, info_span, warn};

use super::dates::extract_dates;
use super::error::SyncError;
use super::folders::{scan_folders, ExportFolder};
use super::matcher::match_files;
use super::sequencer::DateTimeline;
use super::transfer::transfer_files;
use super::types::{Discovered, RunStatus, SimulationDate, TransferOutcome};
use crate::checkpoint::{CheckpointLedger, CheckpointRecord, DateStats};
use crate::store::ObjectStore;

/// Why a folder contributed nothing for the date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The folder has no entry carrying the date
    NoDate,
    /// Entries carry the date but resolve to no files (e.g. an empty date folder)
    NoFiles,
    /// The folder or one of its date folders could not be listed
    Unreadable { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum FolderDisposition {
    Skipped { reason: SkipReason },
    Transferred(TransferOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderResult {
    pub folder: String,
    #[serde(flatten)]
    pub disposition: FolderDisposition,
}

impl FolderResult {
    fn skipped(folder: &ExportFolder, reason: SkipReason) -> Self {
        Self {
            folder: folder.name.clone(),
            disposition: FolderDisposition::Skipped { reason },
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.disposition, FolderDisposition::Skipped { .. })
    }

    pub fn outcome(&self) -> Option<&TransferOutcome> {
        match &self.disposition {
            FolderDisposition::Transferred(outcome) => Some(outcome),
            FolderDisposition::Skipped { .. } => None,
        }
    }
}

/// Everything a processed date produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateSummary {
    /// The row appended to the ledger
    pub record: CheckpointRecord,
    pub files_failed: u64,
    /// Per-file errors across all folders, in processing order
    pub errors: Vec<String>,
    pub folders: Vec<FolderResult>,
}

impl DateSummary {
    pub fn status(&self) -> RunStatus {
        self.record.status
    }
}

/// Result of [`SyncEngine::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunReport {
    /// No export folders under the source root. `unreadable` is set when the
    /// root itself could not be listed.
    NoFolders { unreadable: Option<String> },
    /// Every discovered date is already recorded.
    UpToDate { last_processed: Option<SimulationDate> },
    Processed(DateSummary),
}

/// Wires discovery, sequencing, matching, transfer and the ledger together.
pub struct SyncEngine<'a, S: ?Sized, L: ?Sized> {
    store: &'a S,
    ledger: &'a L,
    source_root: PathBuf,
    target_root: PathBuf,
}

impl<'a, S, L> SyncEngine<'a, S, L>
where
    S: ObjectStore + ?Sized,
    L: CheckpointLedger + ?Sized,
{
    pub fn new(
        store: &'a S,
        ledger: &'a L,
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            ledger,
            source_root: source_root.into(),
            target_root: target_root.into(),
        }
    }

    /// Process the next unprocessed date, or `date_override` when given.
    ///
    /// An override bypasses the ledger's last date but must not already be
    /// recorded; use a manual reset to re-run a date.
    pub fn run(&self, date_override: Option<SimulationDate>) -> Result<RunReport, SyncError> {
        let folders = match scan_folders(self.store, &self.source_root) {
            Discovered::Found(folders) => folders,
            Discovered::Unreadable { reason, .. } => {
                return Ok(RunReport::NoFolders {
                    unreadable: Some(reason),
                })
            }
        };
        if folders.is_empty() {
            warn!(root = %self.source_root.display(), "No export folders found");
            return Ok(RunReport::NoFolders { unreadable: None });
        }

        let date = match date_override {
            Some(date) => {
                info!(date = %date, "Using requested simulation date");
                if self.ledger.contains(date)? {
                    return Err(SyncError::AlreadyRecorded(date));
                }
                date
            }
            None => {
                let last = self.ledger.last_date();
                match last {
                    Some(last) => info!(last = %last, "Last processed simulation date"),
                    None => info!("First run; no simulation dates processed yet"),
                }
                let timeline = DateTimeline::discover(self.store, &folders);
                match timeline.next_date(last) {
                    Some(date) => date,
                    None => {
                        info!(dates = timeline.len(), "All simulation dates have been processed");
                        return Ok(RunReport::UpToDate {
                            last_processed: last,
                        });
                    }
                }
            }
        };

        let span = info_span!("simulation_date", date = %date);
        let _guard = span.enter();
        info!(folders = folders.len(), "Processing simulation date");

        let results: Vec<FolderResult> = folders
            .iter()
            .map(|folder| self.process_folder(folder, date))
            .collect();

        let (stats, files_failed, errors) = aggregate(&results);
        let record = self.ledger.record(date, &stats)?;

        info!(
            status = %record.status,
            with_files = record.folders_with_files,
            skipped = record.folders_skipped,
            files = record.total_files_transferred,
            failed = files_failed,
            "Simulation date complete"
        );

        Ok(RunReport::Processed(DateSummary {
            record,
            files_failed,
            errors,
            folders: results,
        }))
    }

    fn process_folder(&self, folder: &ExportFolder, date: SimulationDate) -> FolderResult {
        let dates = match extract_dates(self.store, &folder.path) {
            Discovered::Found(dates) => dates,
            Discovered::Unreadable { reason, .. } => {
                return FolderResult::skipped(folder, SkipReason::Unreadable { error: reason })
            }
        };
        if !dates.contains(&date) {
            info!(folder = %folder.name, "Skipped; no files for date");
            return FolderResult::skipped(folder, SkipReason::NoDate);
        }

        let files = match match_files(self.store, &folder.path, date) {
            Discovered::Found(files) => files,
            Discovered::Unreadable { reason, .. } => {
                return FolderResult::skipped(folder, SkipReason::Unreadable { error: reason })
            }
        };
        if files.is_empty() {
            info!(folder = %folder.name, "Skipped; date entries hold no files");
            return FolderResult::skipped(folder, SkipReason::NoFiles);
        }

        let dest = self.target_root.join(&folder.name);
        let outcome = transfer_files(self.store, &folder.path, &dest, &files);
        info!(
            folder = %folder.name,
            files = files.len(),
            transferred = outcome.transferred,
            failed = outcome.failed,
            bytes = outcome.bytes,
            "Folder transferred"
        );

        FolderResult {
            folder: folder.name.clone(),
            disposition: FolderDisposition::Transferred(outcome),
        }
    }
}

fn aggregate(results: &[FolderResult]) -> (DateStats, u64, Vec<String>) {
    let mut folders_with_files = 0u32;
    let mut files = 0u64;
    let mut bytes = 0u64;
    let mut failed = 0u64;
    let mut errors = Vec::new();

    for outcome in results.iter().filter_map(FolderResult::outcome) {
        folders_with_files += 1;
        files += outcome.transferred;
        bytes += outcome.bytes;
        failed += outcome.failed;
        errors.extend(outcome.errors.iter().cloned());
    }

    let total = u32::try_from(results.len()).unwrap_or(u32::MAX);
    let stats = DateStats {
        total_folders_found: total,
        folders_with_files,
        folders_skipped: total - folders_with_files,
        total_files_transferred: files,
        total_bytes_transferred: bytes,
        status: RunStatus::from_totals(errors.len(), files),
    };
    (stats, failed, errors)
}

//! Human-readable end-of-run summary.

use std::fmt;

use super::engine::{DateSummary, FolderDisposition, RunReport, SkipReason};

/// Number of individual file errors listed before the rest are counted.
pub const MAX_LISTED_ERRORS: usize = 10;

const RULE: &str = "================================================================================";

pub fn render_report(report: &RunReport) -> String {
    match report {
        RunReport::NoFolders { unreadable: None } => "No export folders found in source.\n".to_string(),
        RunReport::NoFolders {
            unreadable: Some(reason),
        } => format!("Source root could not be listed: {}\n", reason),
        RunReport::UpToDate {
            last_processed: Some(last),
        } => format!(
            "All simulation dates have been processed (last: {}).\n",
            last
        ),
        RunReport::UpToDate {
            last_processed: None,
        } => "No dated files found in any folder.\n".to_string(),
        RunReport::Processed(summary) => render_summary(summary),
    }
}

pub fn render_summary(summary: &DateSummary) -> String {
    summary.to_string()
}

impl fmt::Display for DateSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = &self.record;

        writeln!(f, "{}", RULE)?;
        writeln!(f, "Simulation date: {}", record.simulation_date)?;
        writeln!(f, "{}", RULE)?;
        for folder in &self.folders {
            write!(f, "  {}: ", folder.folder)?;
            match &folder.disposition {
                FolderDisposition::Transferred(outcome) if outcome.failed == 0 => writeln!(
                    f,
                    "{} file(s) transferred ({} bytes)",
                    outcome.transferred, outcome.bytes
                )?,
                FolderDisposition::Transferred(outcome) => writeln!(
                    f,
                    "{} file(s) transferred, {} failed ({} bytes)",
                    outcome.transferred, outcome.failed, outcome.bytes
                )?,
                FolderDisposition::Skipped {
                    reason: SkipReason::NoDate,
                } => writeln!(f, "skipped (no files for {})", record.simulation_date)?,
                FolderDisposition::Skipped {
                    reason: SkipReason::NoFiles,
                } => writeln!(f, "skipped (no files found)")?,
                FolderDisposition::Skipped {
                    reason: SkipReason::Unreadable { error },
                } => writeln!(f, "skipped (unreadable: {})", error)?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Folders with files: {}/{}",
            record.folders_with_files, record.total_folders_found
        )?;
        writeln!(f, "Folders skipped: {}", record.folders_skipped)?;
        writeln!(f, "Total files transferred: {}", record.total_files_transferred)?;
        writeln!(f, "Total bytes transferred: {}", record.total_bytes_transferred)?;
        writeln!(f, "Status: {}", record.status)?;

        if self.errors.is_empty() {
            writeln!(f, "\nAll transfers completed successfully.")?;
        } else {
            writeln!(f, "\nErrors encountered: {}", self.errors.len())?;
            for error in self.errors.iter().take(MAX_LISTED_ERRORS) {
                writeln!(f, "  - {}", error)?;
            }
            if self.errors.len() > MAX_LISTED_ERRORS {
                writeln!(f, "  ... and {} more", self.errors.len() - MAX_LISTED_ERRORS)?;
            }
        }
        writeln!(f, "{}", RULE)
    }
}

//! Core types for date synchronization.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::store::StoreEntry;

/// `YYYY-MM-DD` anywhere in a name. ASCII digits only.
pub(crate) static DATE_IN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]{4}-[0-9]{2}-[0-9]{2})").expect("valid date regex"));

static EXACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

/// Rejected `YYYY-MM-DD` input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid simulation date '{0}': expected a calendar date in YYYY-MM-DD form")]
pub struct InvalidDateError(pub String);

/// The logical day being replayed. Not the wall-clock time of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimulationDate(NaiveDate);

impl SimulationDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Canonical `YYYY-MM-DD` form, used for matching entry names.
    pub fn canonical(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// First `YYYY-MM-DD` substring of `name`, if it is a real calendar date.
    ///
    /// Only the first candidate is considered: `9999-99-99_2024-01-01.csv`
    /// yields nothing.
    pub fn find_in_name(name: &str) -> Option<Self> {
        let candidate = DATE_IN_NAME.find(name)?;
        NaiveDate::parse_from_str(candidate.as_str(), "%Y-%m-%d")
            .ok()
            .map(Self)
    }
}

impl FromStr for SimulationDate {
    type Err = InvalidDateError;

    /// Strict: exactly four, two and two ASCII digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !EXACT_DATE.is_match(trimmed) {
            return Err(InvalidDateError(s.to_string()));
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| InvalidDateError(s.to_string()))
    }
}

impl fmt::Display for SimulationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// How a listed entry encodes its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatedEntryKind {
    /// `table/2024-01-01_orders.csv`
    DirectFile,
    /// `table/2024-01-01/part-0.csv`; expands to the files inside
    DateFolder,
    /// `table/2024-01-01.csv`; the whole stem is the date
    BareDatedFile,
}

impl DatedEntryKind {
    /// Classify an entry already known to carry `date_str` in its name.
    pub fn classify(entry: &StoreEntry, date_str: &str) -> Self {
        if entry.is_dir() {
            return DatedEntryKind::DateFolder;
        }
        let stem = entry.name.split('.').next().unwrap_or(&entry.name);
        if stem == date_str {
            DatedEntryKind::BareDatedFile
        } else {
            DatedEntryKind::DirectFile
        }
    }
}

/// A listed entry resolved to its simulation date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedEntry {
    pub date: SimulationDate,
    pub kind: DatedEntryKind,
    pub name: String,
    pub path: PathBuf,
}

impl DatedEntry {
    /// Resolve an entry through the first date found in its name.
    pub fn from_entry(entry: &StoreEntry) -> Option<Self> {
        let date = SimulationDate::find_in_name(&entry.name)?;
        Some(Self {
            date,
            kind: DatedEntryKind::classify(entry, &date.canonical()),
            name: entry.name.clone(),
            path: entry.path.clone(),
        })
    }
}

/// A concrete leaf file to copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Result of a listing-based discovery step.
///
/// Keeps "nothing there" apart from "could not look".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered<T> {
    Found(T),
    Unreadable { path: PathBuf, reason: String },
}

impl<T: Default> Discovered<T> {
    /// The found value, or the empty value when the location was unreadable.
    pub fn unwrap_or_empty(self) -> T {
        match self {
            Discovered::Found(value) => value,
            Discovered::Unreadable { .. } => T::default(),
        }
    }
}

impl<T> Discovered<T> {
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Discovered::Unreadable { .. })
    }
}

/// Copy results for one folder on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub transferred: u64,
    pub failed: u64,
    pub bytes: u64,
    /// `"<source path>: <error>"`, in copy order
    pub errors: Vec<String>,
}

/// Overall outcome recorded for a simulation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Partial,
    Failed,
}

impl RunStatus {
    /// `failed` when errors and nothing copied, `partial` when errors and
    /// something copied, otherwise `success`.
    pub fn from_totals(error_count: usize, files_transferred: u64) -> Self {
        if error_count == 0 {
            RunStatus::Success
        } else if files_transferred > 0 {
            RunStatus::Partial
        } else {
            RunStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" => Some(RunStatus::Success),
            "partial" => Some(RunStatus::Partial),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

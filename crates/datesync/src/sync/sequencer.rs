//! Global date sequencing across all folders.
//!
//! Every folder's dates are unioned into one timeline and the next date is
//! picked from that timeline, so all folders advance through the same
//! calendar together. A folder without data for the chosen date is skipped
//! for that run and never drifts ahead or behind.

use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::debug;

use super::dates::extract_dates;
use super::folders::ExportFolder;
use super::types::{Discovered, SimulationDate};
use crate::store::ObjectStore;

/// Union of all dates discovered under the source root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateTimeline {
    dates: BTreeSet<SimulationDate>,
    /// Folders that could not be listed while building the timeline
    unreadable: Vec<PathBuf>,
}

impl DateTimeline {
    /// Extract dates from every folder and union them.
    pub fn discover<S: ObjectStore + ?Sized>(store: &S, folders: &[ExportFolder]) -> Self {
        let mut timeline = Self::default();
        for folder in folders {
            match extract_dates(store, &folder.path) {
                Discovered::Found(dates) => timeline.dates.extend(dates),
                Discovered::Unreadable { path, .. } => timeline.unreadable.push(path),
            }
        }
        debug!(
            dates = timeline.dates.len(),
            unreadable = timeline.unreadable.len(),
            "Built date timeline"
        );
        timeline
    }

    pub fn from_dates(dates: impl IntoIterator<Item = SimulationDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
            unreadable: Vec::new(),
        }
    }

    /// Earliest date on a first run, else the smallest date strictly after
    /// `last_processed`.
    pub fn next_date(&self, last_processed: Option<SimulationDate>) -> Option<SimulationDate> {
        match last_processed {
            None => self.dates.iter().next().copied(),
            Some(last) => self
                .dates
                .range((std::ops::Bound::Excluded(last), std::ops::Bound::Unbounded))
                .next()
                .copied(),
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = &SimulationDate> {
        self.dates.iter()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn unreadable(&self) -> &[PathBuf] {
        &self.unreadable
    }
}

/// Discover the timeline for `folders` and pick the next date after
/// `last_processed`.
pub fn next_date<S: ObjectStore + ?Sized>(
    store: &S,
    folders: &[ExportFolder],
    last_processed: Option<SimulationDate>,
) -> Option<SimulationDate> {
    DateTimeline::discover(store, folders).next_date(last_processed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use crate::sync::folders::scan_folders;
    use std::fs;
    use tempfile::TempDir;

    fn date(s: &str) -> SimulationDate {
        s.parse().unwrap()
    }

    #[test]
    fn first_run_picks_earliest_then_advances() {
        let timeline =
            DateTimeline::from_dates([date("2024-01-05"), date("2024-01-01"), date("2024-01-03")]);

        assert_eq!(timeline.next_date(None), Some(date("2024-01-01")));
        assert_eq!(timeline.next_date(Some(date("2024-01-01"))), Some(date("2024-01-03")));
        assert_eq!(timeline.next_date(Some(date("2024-01-02"))), Some(date("2024-01-03")));
        assert_eq!(timeline.next_date(Some(date("2024-01-05"))), None);
        assert_eq!(DateTimeline::default().next_date(None), None);
    }

    #[test]
    fn union_covers_sparse_folders() {
        let tmp = TempDir::new().unwrap();
        let daily = tmp.path().join("daily");
        let weekly = tmp.path().join("weekly");
        fs::create_dir_all(&daily).unwrap();
        fs::create_dir_all(weekly.join("2024-01-07")).unwrap();
        fs::write(daily.join("2024-01-06_daily.csv"), "x").unwrap();
        fs::write(daily.join("2024-01-08_daily.csv"), "x").unwrap();

        let folders = scan_folders(&LocalStore, tmp.path()).unwrap_or_empty();
        let timeline = DateTimeline::discover(&LocalStore, &folders);
        let dates: Vec<_> = timeline.dates().copied().collect();
        assert_eq!(
            dates,
            vec![date("2024-01-06"), date("2024-01-07"), date("2024-01-08")]
        );
        assert_eq!(
            next_date(&LocalStore, &folders, Some(date("2024-01-06"))),
            Some(date("2024-01-07"))
        );
    }

    #[test]
    fn unreadable_folders_are_tracked() {
        let tmp = TempDir::new().unwrap();
        let folders = vec![ExportFolder {
            name: "ghost".to_string(),
            path: tmp.path().join("ghost"),
        }];
        let timeline = DateTimeline::discover(&LocalStore, &folders);
        assert!(timeline.is_empty());
        assert_eq!(timeline.unreadable(), &[tmp.path().join("ghost")]);
    }
}

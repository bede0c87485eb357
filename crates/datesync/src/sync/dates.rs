//! Date extraction from folder listings.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, warn};

use super::types::{DatedEntry, Discovered, SimulationDate};
use crate::store::{ObjectStore, StoreEntry};

/// Dated entries in one listing. Entries without a valid date are dropped.
pub fn dated_entries(entries: &[StoreEntry]) -> Vec<DatedEntry> {
    entries.iter().filter_map(DatedEntry::from_entry).collect()
}

/// Distinct dates in a listing, ascending.
pub fn dates_in_listing(entries: &[StoreEntry]) -> BTreeSet<SimulationDate> {
    dated_entries(entries).into_iter().map(|e| e.date).collect()
}

/// List `folder` one level deep and collect the dates its entries carry.
///
/// Works the same for all three layouts (date-stamped files, date folders,
/// bare date files). A listing failure is reported as
/// [`Discovered::Unreadable`], never as an error.
pub fn extract_dates<S: ObjectStore + ?Sized>(
    store: &S,
    folder: &Path,
) -> Discovered<BTreeSet<SimulationDate>> {
    match store.list(folder) {
        Ok(entries) => {
            let dates = dates_in_listing(&entries);
            debug!(
                folder = %folder.display(),
                entries = entries.len(),
                dates = dates.len(),
                "Extracted dates"
            );
            Discovered::Found(dates)
        }
        Err(err) => {
            warn!(folder = %folder.display(), error = %err, "Could not list folder; no dates found");
            Discovered::Unreadable {
                path: folder.to_path_buf(),
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use std::fs;
    use tempfile::TempDir;

    fn date(s: &str) -> SimulationDate {
        s.parse().unwrap()
    }

    #[test]
    fn mixed_layouts_yield_sorted_distinct_dates() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path();
        fs::write(folder.join("2024-01-03_orders.csv"), "x").unwrap();
        fs::write(folder.join("orders_2024-01-03_part2.csv"), "x").unwrap();
        fs::create_dir(folder.join("2024-01-01")).unwrap();
        fs::write(folder.join("2024-01-02.parquet"), "x").unwrap();
        fs::write(folder.join("_SUCCESS"), "").unwrap();
        fs::write(folder.join("2024-02-30_bad.csv"), "x").unwrap();

        let dates = extract_dates(&LocalStore, folder).unwrap_or_empty();
        let dates: Vec<_> = dates.into_iter().collect();
        assert_eq!(
            dates,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
    }

    #[test]
    fn empty_folder_is_found_but_empty() {
        let tmp = TempDir::new().unwrap();
        let result = extract_dates(&LocalStore, tmp.path());
        assert_eq!(result, Discovered::Found(BTreeSet::new()));
    }

    #[test]
    fn missing_folder_is_unreadable() {
        let tmp = TempDir::new().unwrap();
        let result = extract_dates(&LocalStore, &tmp.path().join("gone"));
        assert!(result.is_unreadable());
        assert!(result.unwrap_or_empty().is_empty());
    }
}

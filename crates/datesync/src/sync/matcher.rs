//! Resolve the leaf files a folder holds for one date.

use std::path::Path;
use tracing::{debug, warn};

use super::types::{DatedEntryKind, Discovered, MatchedFile, SimulationDate};
use crate::store::{ObjectStore, StoreEntry};

/// Files in `folder` for `date`.
///
/// An entry matches when its name contains the canonical `YYYY-MM-DD` form
/// of the date. Matching directories are expanded one level (their files,
/// not their subdirectories); matching files are taken as-is. Results of
/// several matching entries are concatenated in listing-name order.
///
/// An empty result is valid. A folder or date folder that cannot be listed
/// makes the whole folder [`Discovered::Unreadable`].
pub fn match_files<S: ObjectStore + ?Sized>(
    store: &S,
    folder: &Path,
    date: SimulationDate,
) -> Discovered<Vec<MatchedFile>> {
    let needle = date.canonical();

    let mut entries = match store.list(folder) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(folder = %folder.display(), error = %err, "Could not list folder for matching");
            return Discovered::Unreadable {
                path: folder.to_path_buf(),
                reason: err.to_string(),
            };
        }
    };
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let mut files = Vec::new();
    for entry in entries.iter().filter(|e| e.name.contains(&needle)) {
        match DatedEntryKind::classify(entry, &needle) {
            DatedEntryKind::DateFolder => match expand_date_folder(store, entry) {
                Ok(inner) => files.extend(inner),
                Err(err) => {
                    warn!(
                        folder = %entry.path.display(),
                        error = %err,
                        "Could not list date folder"
                    );
                    return Discovered::Unreadable {
                        path: entry.path.clone(),
                        reason: err.to_string(),
                    };
                }
            },
            DatedEntryKind::DirectFile | DatedEntryKind::BareDatedFile => files.push(MatchedFile {
                path: entry.path.clone(),
                size: entry.size,
            }),
        }
    }

    debug!(folder = %folder.display(), date = %date, files = files.len(), "Matched files");
    Discovered::Found(files)
}

fn expand_date_folder<S: ObjectStore + ?Sized>(
    store: &S,
    dir: &StoreEntry,
) -> std::io::Result<Vec<MatchedFile>> {
    let mut inner = store.list(&dir.path)?;
    inner.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(inner
        .into_iter()
        .filter(StoreEntry::is_file)
        .map(|e| MatchedFile {
            path: e.path,
            size: e.size,
        })
        .collect())
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
    fn matches_all_three_layouts() {
        let tmp = TempDir::new().unwrap();
        let folder = tmp.path();
        fs::write(folder.join("2024-01-01_orders.csv"), "abc").unwrap();
        fs::write(folder.join("2024-01-01.json"), "{}").unwrap();
        fs::create_dir_all(folder.join("2024-01-01").join("nested")).unwrap();
        fs::write(folder.join("2024-01-01").join("part-0.csv"), "12345").unwrap();
        fs::write(folder.join("2024-01-02_orders.csv"), "other").unwrap();

        let files = match_files(&LocalStore, folder, date("2024-01-01")).unwrap_or_empty();
        let got: Vec<_> = files
            .iter()
            .map(|f| (f.path.strip_prefix(folder).unwrap().to_path_buf(), f.size))
            .collect();

        assert_eq!(
            got,
            vec![
                (Path::new("2024-01-01").join("part-0.csv"), 5),
                (Path::new("2024-01-01.json").to_path_buf(), 2),
                (Path::new("2024-01-01_orders.csv").to_path_buf(), 3),
            ]
        );
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2024-01-02_orders.csv"), "x").unwrap();

        let result = match_files(&LocalStore, tmp.path(), date("2024-01-01"));
        assert_eq!(result, Discovered::Found(Vec::new()));
    }

    #[test]
    fn unreadable_folder_is_reported() {
        let tmp = TempDir::new().unwrap();
        let result = match_files(&LocalStore, &tmp.path().join("gone"), date("2024-01-01"));
        assert!(result.is_unreadable());
    }
}

use super::{EntryKind, ObjectStore, StoreEntry};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// [`ObjectStore`] over the local filesystem (or any mounted volume).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl ObjectStore for LocalStore {
    fn list(&self, dir: &Path) -> io::Result<Vec<StoreEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // Follows symlinks, so a linked date folder lists as a directory
            let metadata = fs::metadata(entry.path()).or_else(|_| entry.metadata())?;
            let name = entry.file_name().to_string_lossy().trim_end_matches('/').to_string();
            let kind = if metadata.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(StoreEntry {
                name,
                path: entry.path(),
                kind,
                size: if kind == EntryKind::File {
                    metadata.len()
                } else {
                    0
                },
            });
        }
        Ok(entries)
    }

    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(src, dst)?;
        debug!(src = %src.display(), dst = %dst.display(), bytes, "Copied file");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn list_reports_kinds_and_sizes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("2024-01-01_orders.csv"), "a,b\n1,2\n").unwrap();
        fs::create_dir(tmp.path().join("2024-01-02")).unwrap();

        let mut entries = LocalStore.list(tmp.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "2024-01-01_orders.csv");
        assert!(entries[0].is_file());
        assert_eq!(entries[0].size, 8);
        assert_eq!(entries[1].name, "2024-01-02");
        assert!(entries[1].is_dir());
        assert_eq!(entries[1].size, 0);
    }

    #[test]
    fn list_missing_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(LocalStore.list(&tmp.path().join("nope")).is_err());
    }

    #[test]
    fn copy_creates_parents_and_overwrites() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.csv");
        let dst = tmp.path().join("out").join("nested").join("dst.csv");

        fs::write(&src, "first").unwrap();
        LocalStore.copy(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "first");

        fs::write(&src, "second, longer").unwrap();
        LocalStore.copy(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "second, longer");
        assert!(LocalStore.exists(&dst));
    }
}

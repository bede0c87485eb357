//! Top-level export folder discovery.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use super::types::Discovered;
use crate::store::ObjectStore;

/// One dataset partition under the source root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFolder {
    pub name: String,
    pub path: PathBuf,
}

/// Immediate subdirectories of `root`, hidden ones excluded, sorted by name.
///
/// An unlistable root means "no work available": callers get
/// [`Discovered::Unreadable`] and should end the run as a no-op.
pub fn scan_folders<S: ObjectStore + ?Sized>(store: &S, root: &Path) -> Discovered<Vec<ExportFolder>> {
    let entries = match store.list(root) {
        Ok(entries) => entries,
        Err(err) => {
            error!(root = %root.display(), error = %err, "Could not list source root");
            return Discovered::Unreadable {
                path: root.to_path_buf(),
                reason: err.to_string(),
            };
        }
    };

    let mut folders: Vec<ExportFolder> = entries
        .into_iter()
        .filter(|e| e.is_dir() && !e.name.starts_with('.'))
        .map(|e| ExportFolder {
            name: e.name,
            path: e.path,
        })
        .collect();
    folders.sort_by(|a, b| a.name.cmp(&b.name));

    info!(root = %root.display(), folders = folders.len(), "Scanned source folders");
    Discovered::Found(folders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn lists_visible_directories_in_name_order() {
        let tmp = TempDir::new().unwrap();
        for name in ["orders", "customers", ".staging", "zeta"] {
            fs::create_dir(tmp.path().join(name)).unwrap();
        }
        fs::write(tmp.path().join("manifest.json"), "{}").unwrap();

        let folders = scan_folders(&LocalStore, tmp.path()).unwrap_or_empty();
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["customers", "orders", "zeta"]);
        assert_eq!(folders[0].path, tmp.path().join("customers"));
    }

    #[test]
    fn unreadable_root_means_no_folders() {
        let tmp = TempDir::new().unwrap();
        let result = scan_folders(&LocalStore, &tmp.path().join("missing"));
        assert!(result.is_unreadable());
        assert!(result.unwrap_or_empty().is_empty());
    }
}

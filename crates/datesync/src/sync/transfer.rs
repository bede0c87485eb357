//! Copy matched files into the destination tree.

use std::path::Path;
use tracing::{debug, error};

use super::types::{MatchedFile, TransferOutcome};
use crate::store::ObjectStore;

/// Copy `files` from `source_folder` to `dest_folder`, keeping each file's
/// path relative to `source_folder`.
///
/// Copies run in order and one failure never stops the batch. Each failure
/// is recorded as `"<source path>: <error>"`.
pub fn transfer_files<S: ObjectStore + ?Sized>(
    store: &S,
    source_folder: &Path,
    dest_folder: &Path,
    files: &[MatchedFile],
) -> TransferOutcome {
    let mut outcome = TransferOutcome::default();

    for file in files {
        let relative = match file.path.strip_prefix(source_folder) {
            Ok(rel) => rel,
            Err(_) => {
                let message = format!(
                    "{}: not under source folder {}",
                    file.path.display(),
                    source_folder.display()
                );
                error!("{}", message);
                outcome.failed += 1;
                outcome.errors.push(message);
                continue;
            }
        };
        let dest = dest_folder.join(relative);

        match store.copy(&file.path, &dest) {
            Ok(()) => {
                outcome.transferred += 1;
                outcome.bytes += file.size;
                debug!(src = %file.path.display(), dst = %dest.display(), size = file.size, "Transferred");
            }
            Err(err) => {
                error!(src = %file.path.display(), error = %err, "Copy failed");
                outcome.failed += 1;
                outcome.errors.push(format!("{}: {}", file.path.display(), err));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn matched(path: PathBuf) -> MatchedFile {
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        MatchedFile { path, size }
    }

    #[test]
    fn copies_preserve_relative_layout() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src").join("orders");
        let dst = tmp.path().join("dst").join("orders");
        fs::create_dir_all(src.join("2024-01-01")).unwrap();
        fs::write(src.join("2024-01-01").join("part-0.csv"), "abcd").unwrap();
        fs::write(src.join("2024-01-01_extra.csv"), "ef").unwrap();

        let files = vec![
            matched(src.join("2024-01-01").join("part-0.csv")),
            matched(src.join("2024-01-01_extra.csv")),
        ];
        let outcome = transfer_files(&LocalStore, &src, &dst, &files);

        assert_eq!(outcome.transferred, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.bytes, 6);
        assert!(outcome.errors.is_empty());
        assert_eq!(
            fs::read_to_string(dst.join("2024-01-01").join("part-0.csv")).unwrap(),
            "abcd"
        );
        assert_eq!(fs::read_to_string(dst.join("2024-01-01_extra.csv")).unwrap(), "ef");
    }

    #[test]
    fn failures_are_recorded_and_batch_continues() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a_2024-01-01.csv"), "aa").unwrap();
        fs::write(src.join("c_2024-01-01.csv"), "ccc").unwrap();

        let files = vec![
            matched(src.join("a_2024-01-01.csv")),
            MatchedFile {
                path: src.join("b_2024-01-01.csv"),
                size: 7,
            },
            matched(src.join("c_2024-01-01.csv")),
        ];
        let outcome = transfer_files(&LocalStore, &src, &dst, &files);

        assert_eq!(outcome.transferred, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.bytes, 5);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("b_2024-01-01.csv"));
        assert!(dst.join("c_2024-01-01.csv").exists());
    }

    #[test]
    fn file_outside_source_folder_fails() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("elsewhere.csv");
        fs::write(&outside, "x").unwrap();

        let outcome = transfer_files(
            &LocalStore,
            &tmp.path().join("src"),
            &tmp.path().join("dst"),
            &[matched(outside)],
        );
        assert_eq!(outcome.transferred, 0);
        assert_eq!(outcome.failed, 1);
        assert!(outcome.errors[0].contains("not under source folder"));
    }
}

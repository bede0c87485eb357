//! Object store collaborators.
//!
//! The sync engine only needs three primitives from storage: list one
//! directory level, copy one file, and check existence. Everything above
//! this trait is storage-agnostic.

mod local;

pub use local::LocalStore;

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of a listed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreEntry {
    /// Entry name without any trailing separator
    pub name: String,
    /// Absolute path of the entry
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Size in bytes (0 for directories)
    pub size: u64,
}

impl StoreEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Storage primitives consumed by the sync engine.
pub trait ObjectStore {
    /// List the immediate children of `dir`.
    fn list(&self, dir: &Path) -> io::Result<Vec<StoreEntry>>;

    /// Copy a single file, creating missing parent directories and
    /// overwriting `dst` if it already exists.
    fn copy(&self, src: &Path, dst: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

//! Process-level database locking.
//!
//! DuckDB allows a single writer process per file. A sidecar `.lock` file is
//! held with an exclusive `fs2` lock for as long as a writable connection is
//! open, so a second invocation fails fast instead of racing the first.

use chrono::Utc;
use fs2::FileExt;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from lock operations.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Database is locked by another process: {0}")]
    Locked(PathBuf),

    #[error("Failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("Failed to acquire lock: {0}")]
    AcquireFailed(#[source] io::Error),
}

/// Holds an exclusive lock on a database file until dropped.
pub struct DbLockGuard {
    _file: File,
    lock_path: PathBuf,
    owner_path: Option<PathBuf>,
}

impl DbLockGuard {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl std::fmt::Debug for DbLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbLockGuard")
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

impl Drop for DbLockGuard {
    fn drop(&mut self) {
        debug!("Releasing database lock: {}", self.lock_path.display());
        if let Some(path) = &self.owner_path {
            if let Err(e) = fs::remove_file(path) {
                debug!("Failed to remove lock owner file {}: {}", path.display(), e);
            }
        }
    }
}

/// Who holds the lock, written next to the lock file for operators.
#[derive(Serialize)]
struct LockOwner {
    pid: u32,
    exe: Option<String>,
    acquired_at: String,
}

fn owner_path_for(lock_path: &Path) -> PathBuf {
    let ext = lock_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("lock");
    lock_path.with_extension(format!("{ext}.json"))
}

fn write_lock_owner(lock_path: &Path) -> Option<PathBuf> {
    let owner = LockOwner {
        pid: std::process::id(),
        exe: std::env::current_exe().ok().map(|p| p.display().to_string()),
        acquired_at: Utc::now().to_rfc3339(),
    };
    let owner_path = owner_path_for(lock_path);
    match serde_json::to_vec_pretty(&owner)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
        .and_then(|payload| fs::write(&owner_path, payload))
    {
        Ok(()) => Some(owner_path),
        Err(e) => {
            warn!(
                "Failed to write lock owner file {}: {}",
                owner_path.display(),
                e
            );
            None
        }
    }
}

/// Lock file path for a database path.
///
/// - `/data/ledger.duckdb` -> `/data/ledger.duckdb.lock`
/// - `/data/ledger` -> `/data/ledger.lock`
pub fn lock_path_for(db_path: &Path) -> PathBuf {
    let mut lock_path = db_path.to_path_buf();
    match lock_path.extension() {
        Some(ext) => {
            let new_ext = format!("{}.lock", ext.to_string_lossy());
            lock_path.set_extension(new_ext);
        }
        None => {
            lock_path.set_extension("lock");
        }
    }
    lock_path
}

/// Try to take the exclusive lock without blocking.
///
/// Returns `LockError::Locked` immediately when another process holds it.
pub fn try_lock_exclusive(db_path: &Path) -> Result<DbLockGuard, LockError> {
    let lock_path = lock_path_for(db_path);
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(LockError::CreateFailed)?;
        }
    }

    debug!("Attempting to acquire exclusive lock: {}", lock_path.display());

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(LockError::CreateFailed)?;

    // Fully qualified so the fs2 trait method is used, not the std one.
    match FileExt::try_lock_exclusive(&file) {
        Ok(()) => {
            info!("Acquired exclusive database lock: {}", lock_path.display());
            let owner_path = write_lock_owner(&lock_path);
            Ok(DbLockGuard {
                _file: file,
                lock_path,
                owner_path,
            })
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
            debug!("Database is locked by another process");
            Err(LockError::Locked(db_path.to_path_buf()))
        }
        Err(e) => Err(LockError::AcquireFailed(e)),
    }
}

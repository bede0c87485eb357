//! Database layer for datesync.
//!
//! A thin synchronous wrapper over DuckDB. Every writable connection holds an
//! exclusive advisory lock on the database file, so only one process can
//! append to a ledger at a time.
//!
//! # Usage
//!
//! ```rust,ignore
//! use datesync_db::{DbConnection, DbValue};
//!
//! let conn = DbConnection::open_duckdb(Path::new("ledger.duckdb"))?;
//! conn.execute("DELETE FROM main.t WHERE id = ?", &[DbValue::from(1_i64)])?;
//! let count: i64 = conn.query_scalar("SELECT COUNT(*) FROM main.t", &[])?;
//! ```

mod backend;
pub mod lock;

pub use backend::{
    quote_ident, BackendError, DbConnection, DbRow, DbTimestamp, DbTimestampError,
    DbTransaction, DbValue, FromDbValue,
};
pub use lock::{lock_path_for, DbLockGuard, LockError};

//! datesync: replay dated export folders into a destination tree, one
//! simulation date per run, with a DuckDB checkpoint ledger.
//!
//! ```rust,ignore
//! use datesync::checkpoint::DuckDbLedger;
//! use datesync::store::LocalStore;
//! use datesync::sync::{render_report, SyncEngine};
//!
//! let ledger = DuckDbLedger::open(&config.ledger, false)?;
//! let engine = SyncEngine::new(&LocalStore, &ledger, &config.source_root, &config.target_root);
//! println!("{}", render_report(&engine.run(None)?));
//! ```

pub mod checkpoint;
pub mod config;
pub mod store;
pub mod sync;

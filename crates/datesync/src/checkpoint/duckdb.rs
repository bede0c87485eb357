//! DuckDB-backed checkpoint ledger.

use chrono::{DateTime, SubsecRound, Utc};
use datesync_db::{quote_ident, BackendError, DbConnection, DbRow, DbTimestamp, DbValue};
use std::fs;
use tracing::{info, warn};

use super::{CheckpointLedger, CheckpointRecord, DateStats, LedgerError, ProgressOverview};
use crate::config::LedgerConfig;
use crate::sync::{RunStatus, SimulationDate};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

const RECORD_COLUMNS: &str = "CAST(simulation_date AS VARCHAR) AS simulation_date, \
     total_folders_found, folders_with_files, folders_skipped, \
     total_files_transferred, total_bytes_transferred, last_updated, status";

/// Ledger stored in a DuckDB table, keyed by `simulation_date`.
pub struct DuckDbLedger {
    conn: DbConnection,
    schema: String,
    table: String,
    /// Quoted `"schema"."table"`
    qualified: String,
    location: String,
}

impl std::fmt::Debug for DuckDbLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbLedger")
            .field("location", &self.location)
            .field("table", &self.qualified)
            .finish()
    }
}

impl DuckDbLedger {
    /// Open the ledger for writing, creating schema and table as needed.
    ///
    /// Holds the exclusive process lock until dropped. With `restart` the
    /// table is dropped and recreated empty.
    pub fn open(config: &LedgerConfig, restart: bool) -> Result<Self, LedgerError> {
        config
            .validate()
            .map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = DbConnection::open_duckdb(&config.path).map_err(|e| match e {
            BackendError::Locked(_) => LedgerError::Locked(config.path.clone()),
            other => LedgerError::Backend(other),
        })?;
        let ledger = Self::with_connection(
            conn,
            &config.schema,
            &config.table,
            config.path.display().to_string(),
        );
        ledger.initialize(restart)?;
        Ok(ledger)
    }

    /// Open an existing ledger file without taking the writer lock.
    ///
    /// Fails if the file does not exist. Writes through this handle fail
    /// with [`BackendError::ReadOnly`].
    pub fn open_readonly(config: &LedgerConfig) -> Result<Self, LedgerError> {
        config
            .validate()
            .map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
        if !config.path.exists() {
            return Err(LedgerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no ledger at {}", config.path.display()),
            )));
        }
        let conn = DbConnection::open_duckdb_readonly(&config.path)?;
        Ok(Self::with_connection(
            conn,
            &config.schema,
            &config.table,
            config.path.display().to_string(),
        ))
    }

    /// Fresh in-memory ledger.
    pub fn open_in_memory(schema: &str, table: &str) -> Result<Self, LedgerError> {
        let conn = DbConnection::open_duckdb_memory()?;
        let ledger = Self::with_connection(conn, schema, table, ":memory:".to_string());
        ledger.initialize(false)?;
        Ok(ledger)
    }

    fn with_connection(conn: DbConnection, schema: &str, table: &str, location: String) -> Self {
        Self {
            conn,
            schema: schema.to_string(),
            table: table.to_string(),
            qualified: format!("{}.{}", quote_ident(schema), quote_ident(table)),
            location,
        }
    }

    fn initialize(&self, restart: bool) -> Result<(), LedgerError> {
        self.conn.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            quote_ident(&self.schema)
        ))?;

        if restart {
            warn!(ledger = %self.location, table = %self.qualified, "Restart requested; dropping ledger table");
            self.conn
                .execute_batch(&format!("DROP TABLE IF EXISTS {}", self.qualified))?;
        }

        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                simulation_date DATE NOT NULL PRIMARY KEY,
                total_folders_found INTEGER NOT NULL,
                folders_with_files INTEGER NOT NULL,
                folders_skipped INTEGER NOT NULL,
                total_files_transferred INTEGER NOT NULL,
                total_bytes_transferred BIGINT NOT NULL,
                last_updated TIMESTAMP NOT NULL,
                status VARCHAR NOT NULL
            )
            "#,
            self.qualified
        ))?;
        info!(ledger = %self.location, table = %self.qualified, "Ledger ready");
        Ok(())
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// False for a read-only handle on a file that was never initialized.
    pub fn table_exists(&self) -> Result<bool, LedgerError> {
        let count: i64 = self.conn.query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            &[
                DbValue::from(self.schema.as_str()),
                DbValue::from(self.table.as_str()),
            ],
        )?;
        Ok(count > 0)
    }

    /// Most recent records first.
    pub fn history(&self, limit: usize) -> Result<Vec<CheckpointRecord>, LedgerError> {
        if !self.table_exists()? {
            return Ok(Vec::new());
        }
        let rows = self.conn.query_all(
            &format!(
                "SELECT {} FROM {} ORDER BY simulation_date DESC LIMIT {}",
                RECORD_COLUMNS, self.qualified, limit
            ),
            &[],
        )?;
        rows.iter().map(record_from_row).collect()
    }

    pub fn progress(&self) -> Result<ProgressOverview, LedgerError> {
        if !self.table_exists()? {
            return Ok(ProgressOverview::default());
        }
        let row = self.conn.query_one(
            &format!(
                r#"
                SELECT
                    COUNT(*) AS dates_processed,
                    CAST(MIN(simulation_date) AS VARCHAR) AS first_date,
                    CAST(MAX(simulation_date) AS VARCHAR) AS latest_date,
                    SUM(total_files_transferred) AS total_files,
                    SUM(total_bytes_transferred) AS total_bytes,
                    AVG(folders_with_files) AS avg_folders_with_files,
                    AVG(folders_skipped) AS avg_folders_skipped,
                    SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END) AS successful_runs,
                    SUM(CASE WHEN status = 'partial' THEN 1 ELSE 0 END) AS partial_runs,
                    SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END) AS failed_runs
                FROM {}
                "#,
                self.qualified
            ),
            &[],
        )?;

        Ok(ProgressOverview {
            dates_processed: to_u64(row.get_by_name::<i64>("dates_processed")?, "dates_processed")?,
            first_date: parse_optional_date(row.get_by_name("first_date")?)?,
            latest_date: parse_optional_date(row.get_by_name("latest_date")?)?,
            total_files: optional_count(&row, "total_files")?,
            total_bytes: optional_count(&row, "total_bytes")?,
            avg_folders_with_files: row.get_by_name("avg_folders_with_files")?,
            avg_folders_skipped: row.get_by_name("avg_folders_skipped")?,
            successful_runs: optional_count(&row, "successful_runs")?,
            partial_runs: optional_count(&row, "partial_runs")?,
            failed_runs: optional_count(&row, "failed_runs")?,
        })
    }

    /// Delete the record for `date` so it can be processed again.
    ///
    /// Returns false when nothing was recorded for that date.
    pub fn reset_date(&self, date: SimulationDate) -> Result<bool, LedgerError> {
        let deleted = self.conn.execute(
            &format!(
                "DELETE FROM {} WHERE simulation_date = CAST(? AS DATE)",
                self.qualified
            ),
            &[DbValue::from(date.canonical())],
        )?;
        if deleted > 0 {
            warn!(date = %date, ledger = %self.location, "Checkpoint record deleted");
        }
        Ok(deleted > 0)
    }

    fn try_last_date(&self) -> Result<Option<SimulationDate>, LedgerError> {
        let max: Option<String> = self.conn.query_scalar(
            &format!(
                "SELECT CAST(MAX(simulation_date) AS VARCHAR) FROM {}",
                self.qualified
            ),
            &[],
        )?;
        parse_optional_date(max)
    }
}

impl CheckpointLedger for DuckDbLedger {
    fn last_date(&self) -> Option<SimulationDate> {
        match self.try_last_date() {
            Ok(date) => date,
            Err(err) => {
                warn!(ledger = %self.location, error = %err, "Could not read last processed date; treating as first run");
                None
            }
        }
    }

    fn contains(&self, date: SimulationDate) -> Result<bool, LedgerError> {
        let count: i64 = self.conn.query_scalar(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE simulation_date = CAST(? AS DATE)",
                self.qualified
            ),
            &[DbValue::from(date.canonical())],
        )?;
        Ok(count > 0)
    }

    fn record(&self, date: SimulationDate, stats: &DateStats) -> Result<CheckpointRecord, LedgerError> {
        let last_updated: DateTime<Utc> = Utc::now().trunc_subsecs(6);
        let record = CheckpointRecord::new(date, stats, last_updated);
        let exists_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE simulation_date = CAST(? AS DATE)",
            self.qualified
        );
        let insert_sql = format!(
            "INSERT INTO {} (simulation_date, total_folders_found, folders_with_files, \
             folders_skipped, total_files_transferred, total_bytes_transferred, last_updated, status) \
             VALUES (CAST(? AS DATE), ?, ?, ?, ?, ?, ?, ?)",
            self.qualified
        );
        let params = [
            DbValue::from(date.canonical()),
            DbValue::from(i64::from(stats.total_folders_found)),
            DbValue::from(i64::from(stats.folders_with_files)),
            DbValue::from(i64::from(stats.folders_skipped)),
            DbValue::from(to_i64(stats.total_files_transferred, "total_files_transferred")?),
            DbValue::from(to_i64(stats.total_bytes_transferred, "total_bytes_transferred")?),
            DbValue::from(DbTimestamp::from_chrono(last_updated)),
            DbValue::from(stats.status.as_str()),
        ];

        let inserted = self.conn.transaction(|tx| {
            let existing: i64 = tx.query_scalar(&exists_sql, &params[..1])?;
            if existing > 0 {
                return Ok(false);
            }
            tx.execute(&insert_sql, &params)?;
            Ok(true)
        });

        match inserted {
            Ok(true) => {
                info!(
                    date = %date,
                    status = %stats.status,
                    files = stats.total_files_transferred,
                    bytes = stats.total_bytes_transferred,
                    "Checkpoint recorded"
                );
                Ok(record)
            }
            Ok(false) => Err(LedgerError::DuplicateDate(date)),
            Err(err) if err.is_constraint_violation() => Err(LedgerError::DuplicateDate(date)),
            Err(err) => Err(err.into()),
        }
    }
}

fn record_from_row(row: &DbRow) -> Result<CheckpointRecord, LedgerError> {
    let date_text: String = row.get_by_name("simulation_date")?;
    let simulation_date = date_text
        .parse::<SimulationDate>()
        .map_err(|e| LedgerError::InvalidRecord(e.to_string()))?;
    let status_text: String = row.get_by_name("status")?;
    let status = RunStatus::parse(&status_text)
        .ok_or_else(|| LedgerError::InvalidRecord(format!("unknown status '{}'", status_text)))?;
    let last_updated: DbTimestamp = row.get_by_name("last_updated")?;

    Ok(CheckpointRecord {
        simulation_date,
        total_folders_found: to_u32(row.get_by_name("total_folders_found")?, "total_folders_found")?,
        folders_with_files: to_u32(row.get_by_name("folders_with_files")?, "folders_with_files")?,
        folders_skipped: to_u32(row.get_by_name("folders_skipped")?, "folders_skipped")?,
        total_files_transferred: to_u64(
            row.get_by_name("total_files_transferred")?,
            "total_files_transferred",
        )?,
        total_bytes_transferred: to_u64(
            row.get_by_name("total_bytes_transferred")?,
            "total_bytes_transferred",
        )?,
        last_updated: *last_updated.as_chrono(),
        status,
    })
}

fn parse_optional_date(value: Option<String>) -> Result<Option<SimulationDate>, LedgerError> {
    value
        .map(|s| s.parse::<SimulationDate>())
        .transpose()
        .map_err(|e| LedgerError::InvalidRecord(e.to_string()))
}

/// SUM over an empty table is NULL.
fn optional_count(row: &DbRow, column: &'static str) -> Result<u64, LedgerError> {
    let value: Option<i64> = row.get_by_name(column)?;
    to_u64(value.unwrap_or(0), column)
}

fn to_u64(value: i64, column: &str) -> Result<u64, LedgerError> {
    u64::try_from(value)
        .map_err(|_| LedgerError::InvalidRecord(format!("negative {}: {}", column, value)))
}

fn to_u32(value: i64, column: &str) -> Result<u32, LedgerError> {
    u32::try_from(value)
        .map_err(|_| LedgerError::InvalidRecord(format!("{} out of range: {}", column, value)))
}

fn to_i64(value: u64, column: &str) -> Result<i64, LedgerError> {
    i64::try_from(value)
        .map_err(|_| LedgerError::InvalidRecord(format!("{} too large: {}", column, value)))
}

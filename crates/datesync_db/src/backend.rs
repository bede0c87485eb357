//! DuckDB connection wrapper.
//!
//! Synchronous, single-connection. Writable connections hold the file lock
//! from [`crate::lock`] for their whole lifetime.

use std::path::Path;
use std::rc::Rc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug_span, info};

/// Errors from database backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database is locked by another process: {0}")]
    Locked(String),

    #[error("Operation requires write access but database is read-only")]
    ReadOnly,

    #[error("Query error: {0}")]
    Query(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl BackendError {
    /// True when DuckDB rejected a write because of a PRIMARY KEY / UNIQUE constraint.
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            BackendError::DuckDb(err) => {
                // DuckDB reports these at INSERT or, inside a transaction, at COMMIT
                let msg = err.to_string().to_lowercase();
                msg.contains("constraint error")
                    || msg.contains("duplicate key")
                    || msg.contains("constraint violated")
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccessMode {
    /// Read-write access, exclusive lock held
    ReadWrite,
    /// Read-only access, no lock
    ReadOnly,
}

/// UTC timestamp stored in TIMESTAMP columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbTimestamp {
    inner: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTimestampError {
    message: String,
}

impl std::fmt::Display for DbTimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DbTimestampError {}

impl DbTimestamp {
    /// Parse an RFC3339 timestamp string.
    pub fn from_rfc3339(value: &str) -> Result<Self, DbTimestampError> {
        chrono::DateTime::parse_from_rfc3339(value)
            .map(|dt| Self {
                inner: dt.with_timezone(&chrono::Utc),
            })
            .map_err(|e| DbTimestampError {
                message: format!("Invalid timestamp: {}", e),
            })
    }

    pub fn from_chrono(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self { inner: value }
    }

    pub fn as_chrono(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.inner
    }
}

/// Value type for query parameters and results.
#[derive(Debug, Clone)]
pub enum DbValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(DbTimestamp),
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        DbValue::Integer(v)
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        DbValue::Text(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        DbValue::Text(v.to_string())
    }
}

impl From<DbTimestamp> for DbValue {
    fn from(v: DbTimestamp) -> Self {
        DbValue::Timestamp(v)
    }
}

impl<T: Into<DbValue>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DbValue::Null,
        }
    }
}

/// One result row.
#[derive(Debug, Clone)]
pub struct DbRow {
    columns: Vec<String>,
    values: Vec<DbValue>,
}

impl DbRow {
    pub fn new(columns: Vec<String>, values: Vec<DbValue>) -> Self {
        Self { columns, values }
    }

    /// Get a value by column index.
    pub fn get<T: FromDbValue>(&self, index: usize) -> Result<T, BackendError> {
        self.values
            .get(index)
            .ok_or_else(|| {
                BackendError::TypeConversion(format!("Column index {} out of bounds", index))
            })
            .and_then(|v| T::from_db_value(v))
    }

    /// Get a value by column name.
    pub fn get_by_name<T: FromDbValue>(&self, name: &str) -> Result<T, BackendError> {
        let index =
            self.columns.iter().position(|c| c == name).ok_or_else(|| {
                BackendError::TypeConversion(format!("Column '{}' not found", name))
            })?;
        self.get(index)
    }
}

/// Conversion out of a [`DbValue`].
pub trait FromDbValue: Sized {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError>;
}

impl FromDbValue for i64 {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Integer(v) => Ok(*v),
            DbValue::Null => Err(BackendError::TypeConversion(
                "i64 field is NULL - use Option<i64> for nullable columns".to_string(),
            )),
            _ => Err(BackendError::TypeConversion("Expected integer".to_string())),
        }
    }
}

impl FromDbValue for f64 {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Real(v) => Ok(*v),
            DbValue::Integer(v) => Ok(*v as f64),
            DbValue::Null => Err(BackendError::TypeConversion(
                "f64 field is NULL - use Option<f64> for nullable columns".to_string(),
            )),
            _ => Err(BackendError::TypeConversion("Expected real".to_string())),
        }
    }
}

impl FromDbValue for String {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Text(v) => Ok(v.clone()),
            DbValue::Null => Err(BackendError::TypeConversion(
                "String field is NULL - use Option<String> for nullable columns".to_string(),
            )),
            _ => Err(BackendError::TypeConversion("Expected text".to_string())),
        }
    }
}

impl FromDbValue for DbTimestamp {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Timestamp(v) => Ok(v.clone()),
            DbValue::Text(v) => DbTimestamp::from_rfc3339(v)
                .map_err(|e| BackendError::TypeConversion(e.to_string())),
            DbValue::Null => Err(BackendError::TypeConversion(
                "DbTimestamp field is NULL - use Option<DbTimestamp> for nullable columns"
                    .to_string(),
            )),
            _ => Err(BackendError::TypeConversion(
                "Expected timestamp".to_string(),
            )),
        }
    }
}

impl<T: FromDbValue> FromDbValue for Option<T> {
    fn from_db_value(value: &DbValue) -> Result<Self, BackendError> {
        match value {
            DbValue::Null => Ok(None),
            _ => T::from_db_value(value).map(Some),
        }
    }
}

/// A DuckDB connection.
#[derive(Clone)]
pub struct DbConnection {
    conn: Rc<duckdb::Connection>,
    access_mode: AccessMode,
    /// Dropping the last clone releases the file lock.
    #[allow(dead_code)]
    lock_guard: Option<Rc<crate::lock::DbLockGuard>>,
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("backend", &"DuckDB")
            .field("access_mode", &self.access_mode)
            .finish()
    }
}

impl DbConnection {
    /// Open (or create) a DuckDB file with the exclusive writer lock.
    pub fn open_duckdb(path: &Path) -> Result<Self, BackendError> {
        use crate::lock::{try_lock_exclusive, LockError};

        let lock_guard = try_lock_exclusive(path).map_err(|e| match e {
            LockError::Locked(p) => BackendError::Locked(p.display().to_string()),
            LockError::CreateFailed(io) => {
                BackendError::Database(format!("Lock file error: {}", io))
            }
            LockError::AcquireFailed(io) => {
                BackendError::Database(format!("Lock acquire error: {}", io))
            }
        })?;

        let conn = Rc::new(duckdb::Connection::open(path)?);
        info!(
            "Opened DuckDB database with exclusive lock: {}",
            path.display()
        );

        Ok(Self {
            conn,
            access_mode: AccessMode::ReadWrite,
            lock_guard: Some(Rc::new(lock_guard)),
        })
    }

    /// Open an existing DuckDB file read-only (no lock).
    pub fn open_duckdb_readonly(path: &Path) -> Result<Self, BackendError> {
        use duckdb::{AccessMode as DuckAccessMode, Config};

        let config = Config::default()
            .access_mode(DuckAccessMode::ReadOnly)
            .map_err(BackendError::from)?;
        let conn = Rc::new(duckdb::Connection::open_with_flags(path, config)?);
        info!("Opened DuckDB database (read-only): {}", path.display());

        Ok(Self {
            conn,
            access_mode: AccessMode::ReadOnly,
            lock_guard: None,
        })
    }

    /// In-memory database, used by tests.
    pub fn open_duckdb_memory() -> Result<Self, BackendError> {
        let conn = Rc::new(duckdb::Connection::open_in_memory()?);

        Ok(Self {
            conn,
            access_mode: AccessMode::ReadWrite,
            lock_guard: None,
        })
    }

    pub fn is_writable(&self) -> bool {
        self.access_mode == AccessMode::ReadWrite
    }

    /// Execute a SQL statement and return the affected row count.
    pub fn execute(&self, sql: &str, params: &[DbValue]) -> Result<u64, BackendError> {
        if !self.is_writable() {
            return Err(BackendError::ReadOnly);
        }

        Self::execute_on_conn(self.conn.as_ref(), sql, params)
    }

    /// Execute a batch of SQL statements.
    pub fn execute_batch(&self, sql: &str) -> Result<(), BackendError> {
        if !self.is_writable() {
            return Err(BackendError::ReadOnly);
        }

        Self::execute_batch_on_conn(self.conn.as_ref(), sql)
    }

    pub fn query_all(&self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, BackendError> {
        Self::query_on_conn(self.conn.as_ref(), sql, params)
    }

    pub fn query_optional(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Option<DbRow>, BackendError> {
        let rows = self.query_all(sql, params)?;
        Ok(rows.into_iter().next())
    }

    pub fn query_one(&self, sql: &str, params: &[DbValue]) -> Result<DbRow, BackendError> {
        self.query_optional(sql, params)?
            .ok_or_else(|| BackendError::Query("Expected one row, got none".to_string()))
    }

    pub fn query_scalar<T: FromDbValue>(
        &self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<T, BackendError> {
        let row = self.query_one(sql, params)?;
        row.get(0)
    }

    /// Run `op` inside BEGIN/COMMIT, rolling back on error.
    pub fn transaction<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        F: for<'a> FnOnce(&'a mut DbTransaction<'a>) -> Result<T, BackendError>,
    {
        if !self.is_writable() {
            return Err(BackendError::ReadOnly);
        }

        self.conn.execute_batch("BEGIN")?;
        let mut tx = DbTransaction {
            conn: self.conn.as_ref(),
        };
        let result = op(&mut tx);

        match result {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(err) => match self.conn.execute_batch("ROLLBACK") {
                Ok(()) => Err(err),
                Err(rollback_err) => Err(BackendError::Transaction(format!(
                    "Transaction failed: {}; rollback failed: {}",
                    err, rollback_err
                ))),
            },
        }
    }

    fn execute_on_conn(
        conn: &duckdb::Connection,
        sql: &str,
        params: &[DbValue],
    ) -> Result<u64, BackendError> {
        let span = debug_span!(
            "db.exec",
            op = sql_op_name(sql),
            sql_hash = %hash_sql(sql),
            duration_ms = tracing::field::Empty
        );
        let _guard = span.enter();
        let start = Instant::now();

        let mut stmt = conn.prepare(sql)?;
        let duckdb_params = to_duckdb_params(params);
        let param_refs: Vec<&dyn duckdb::ToSql> = duckdb_params
            .iter()
            .map(|v| v as &dyn duckdb::ToSql)
            .collect();
        let rows = stmt.execute(param_refs.as_slice())?;
        span.record("duration_ms", start.elapsed().as_millis() as u64);
        Ok(rows as u64)
    }

    fn execute_batch_on_conn(conn: &duckdb::Connection, sql: &str) -> Result<(), BackendError> {
        let span = debug_span!(
            "db.exec_batch",
            sql_hash = %hash_sql(sql),
            duration_ms = tracing::field::Empty
        );
        let _guard = span.enter();
        let start = Instant::now();
        conn.execute_batch(sql)?;
        span.record("duration_ms", start.elapsed().as_millis() as u64);
        Ok(())
    }

    fn query_on_conn(
        conn: &duckdb::Connection,
        sql: &str,
        params: &[DbValue],
    ) -> Result<Vec<DbRow>, BackendError> {
        let span = debug_span!(
            "db.query",
            op = sql_op_name(sql),
            sql_hash = %hash_sql(sql),
            duration_ms = tracing::field::Empty
        );
        let _guard = span.enter();
        let start = Instant::now();

        let mut stmt = conn.prepare(sql)?;
        let duckdb_params = to_duckdb_params(params);
        let param_refs: Vec<&dyn duckdb::ToSql> = duckdb_params
            .iter()
            .map(|v| v as &dyn duckdb::ToSql)
            .collect();

        let mut rows_iter = stmt.query(param_refs.as_slice())?;

        let (column_count, columns) = match rows_iter.as_ref() {
            Some(stmt_ref) => {
                let count = stmt_ref.column_count();
                let cols: Vec<String> = (0..count)
                    .map(|i| {
                        stmt_ref
                            .column_name(i)
                            .map(|s| s.to_string())
                            .unwrap_or_else(|_| format!("col{}", i))
                    })
                    .collect();
                (count, cols)
            }
            None => return Ok(Vec::new()),
        };

        let mut result = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(duckdb_value_to_db_value(row, i)?);
            }
            result.push(DbRow::new(columns.clone(), values));
        }

        span.record("duration_ms", start.elapsed().as_millis() as u64);
        Ok(result)
    }
}

/// Statements executed inside [`DbConnection::transaction`].
pub struct DbTransaction<'a> {
    conn: &'a duckdb::Connection,
}

impl<'a> DbTransaction<'a> {
    pub fn execute(&mut self, sql: &str, params: &[DbValue]) -> Result<u64, BackendError> {
        DbConnection::execute_on_conn(self.conn, sql, params)
    }

    pub fn query_all(&mut self, sql: &str, params: &[DbValue]) -> Result<Vec<DbRow>, BackendError> {
        DbConnection::query_on_conn(self.conn, sql, params)
    }

    pub fn query_scalar<T: FromDbValue>(
        &mut self,
        sql: &str,
        params: &[DbValue],
    ) -> Result<T, BackendError> {
        let row = self
            .query_all(sql, params)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Query("Expected one row, got none".to_string()))?;
        row.get(0)
    }
}

fn to_duckdb_params(params: &[DbValue]) -> Vec<duckdb::types::Value> {
    params
        .iter()
        .map(|p| match p {
            DbValue::Null => duckdb::types::Value::Null,
            DbValue::Integer(v) => duckdb::types::Value::BigInt(*v),
            DbValue::Real(v) => duckdb::types::Value::Double(*v),
            DbValue::Text(v) => duckdb::types::Value::Text(v.clone()),
            DbValue::Timestamp(v) => {
                let micros = v.as_chrono().timestamp_micros();
                duckdb::types::Value::Timestamp(duckdb::types::TimeUnit::Microsecond, micros)
            }
        })
        .collect()
}

fn duckdb_value_to_db_value(row: &duckdb::Row, index: usize) -> Result<DbValue, duckdb::Error> {
    use duckdb::types::{TimeUnit, ValueRef};

    match row.get_ref(index)? {
        ValueRef::Null => Ok(DbValue::Null),
        ValueRef::Boolean(v) => Ok(DbValue::Integer(i64::from(v))),
        ValueRef::TinyInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::SmallInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::Int(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::BigInt(v) => Ok(DbValue::Integer(v)),
        // SUM over INTEGER/BIGINT columns yields HUGEINT
        ValueRef::HugeInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::UTinyInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::USmallInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::UInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::UBigInt(v) => Ok(DbValue::Integer(v as i64)),
        ValueRef::Float(v) => Ok(DbValue::Real(v as f64)),
        ValueRef::Double(v) => Ok(DbValue::Real(v)),
        ValueRef::Text(v) => Ok(DbValue::Text(String::from_utf8_lossy(v).to_string())),
        ValueRef::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v * 1_000_000,
                TimeUnit::Millisecond => v * 1_000,
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            let secs = micros.div_euclid(1_000_000);
            let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
            match chrono::DateTime::from_timestamp(secs, nanos) {
                Some(dt) => Ok(DbValue::Timestamp(DbTimestamp::from_chrono(dt))),
                None => Ok(DbValue::Integer(micros)),
            }
        }
        ValueRef::Date32(days) => {
            // 719163 = days from 0001-01-01 to 1970-01-01
            match chrono::NaiveDate::from_num_days_from_ce_opt(719163 + days) {
                Some(date) => Ok(DbValue::Text(date.format("%Y-%m-%d").to_string())),
                None => Ok(DbValue::Integer(days as i64)),
            }
        }
        other => {
            tracing::warn!(
                "DuckDB type {:?} at column {} mapped to debug string",
                std::mem::discriminant(&other),
                index
            );
            Ok(DbValue::Text(format!("{:?}", other)))
        }
    }
}

/// Quote an SQL identifier (`"name"`, embedded quotes doubled).
pub fn quote_ident(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('"');
    for ch in name.chars() {
        if ch == '"' {
            escaped.push('"');
        }
        escaped.push(ch);
    }
    escaped.push('"');
    escaped
}

fn sql_op_name(sql: &str) -> &str {
    sql.split_whitespace().next().unwrap_or("unknown")
}

fn hash_sql(sql: &str) -> String {
    // FNV-1a 64-bit: stable, low-cardinality span field.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in sql.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", hash)
}

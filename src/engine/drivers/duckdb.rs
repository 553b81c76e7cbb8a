// SPDX-License-Identifier: Apache-2.0

//! DuckDB Driver
//!
//! Implements the connectivity traits for DuckDB using the native `duckdb` crate.
//!
//! ## DuckDB Specifics
//!
//! - `url` in ConnectionProperties contains the file path
//! - Supports `:memory:` and `duckdb::memory:` for in-memory databases
//! - `options` are passed through as DuckDB configuration flags
//!   (e.g., `threads`, `access_mode`)
//!
//! ## Statement Model
//!
//! A `duckdb::Statement` borrows its connection, so it cannot outlive the call
//! that created it. The statement handle returned by [`DuckDbConnection::prepare`]
//! therefore shares the connection behind a mutex and re-prepares the validated
//! SQL when the query runs. Results are drained into the cursor before the
//! borrow ends; the cursor then yields them forward-only.

use std::sync::Arc;

use ::duckdb::types::{TimeUnit, Value as DuckValue};
use ::duckdb::{params_from_iter, Config, Connection as DuckConnection};
use chrono::{DateTime, NaiveDate, NaiveTime};
use parking_lot::Mutex;
use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::traits::{Connection, Connector, Cursor, Statement};
use crate::engine::types::{ColumnInfo, ConnectionProperties, Row, Value};

const MEMORY_PATHS: [&str; 2] = [":memory:", "duckdb::memory:"];

/// Day number of 1970-01-01 counted from 0001-01-01 (day 1).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// DuckDB connector. Stateless: every `connect` opens a new database handle.
#[derive(Debug, Default)]
pub struct DuckDbConnector;

impl DuckDbConnector {
    pub fn new() -> Self {
        Self
    }

    fn build_config(properties: &ConnectionProperties) -> EngineResult<Config> {
        let mut config = Config::default();
        for (key, value) in &properties.options {
            config = config.with(key, value).map_err(|e| {
                EngineError::validation(format!("Invalid DuckDB option '{key}': {e}"))
            })?;
        }
        Ok(config)
    }

    /// Opens a DuckDB connection from the given properties.
    fn open_connection(properties: &ConnectionProperties) -> EngineResult<DuckConnection> {
        let path = properties.url.trim();
        if path.is_empty() {
            return Err(EngineError::connection_failed("DuckDB path cannot be empty."));
        }

        let config = Self::build_config(properties)?;
        if MEMORY_PATHS.contains(&path) {
            DuckConnection::open_in_memory_with_flags(config).map_err(|e| {
                EngineError::connection_failed(format!("Failed to open DuckDB in-memory: {e}"))
            })
        } else {
            DuckConnection::open_with_flags(path, config).map_err(|e| {
                EngineError::connection_failed(format!("Failed to open DuckDB file '{path}': {e}"))
            })
        }
    }
}

impl Connector for DuckDbConnector {
    fn driver_id(&self) -> &'static str {
        "duckdb"
    }

    fn driver_name(&self) -> &'static str {
        "DuckDB"
    }

    fn connect(&self, properties: &ConnectionProperties) -> EngineResult<Box<dyn Connection>> {
        let conn = Self::open_connection(properties)?;
        debug!(path = %properties.url, "DuckDB connection opened");
        Ok(Box::new(DuckDbConnection {
            conn: Arc::new(Mutex::new(conn)),
        }))
    }
}

/// An open DuckDB connection.
pub struct DuckDbConnection {
    conn: Arc<Mutex<DuckConnection>>,
}

impl Connection for DuckDbConnection {
    fn prepare(&mut self, sql: &str) -> EngineResult<Box<dyn Statement>> {
        let parameter_count = {
            let conn = self.conn.lock();
            let stmt = conn
                .prepare(sql)
                .map_err(|e| EngineError::classify(e.to_string()))?;
            stmt.parameter_count()
        };

        Ok(Box::new(DuckDbStatement {
            conn: Arc::clone(&self.conn),
            sql: sql.to_string(),
            bound: vec![None; parameter_count],
        }))
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => mutex.into_inner().close().map_err(|(_, e)| {
                EngineError::connection_failed(format!("Failed to close DuckDB connection: {e}"))
            }),
            // A statement still holds the handle; it is closed when that statement drops.
            Err(_) => Ok(()),
        }
    }
}

/// A prepared DuckDB statement.
pub struct DuckDbStatement {
    conn: Arc<Mutex<DuckConnection>>,
    sql: String,
    bound: Vec<Option<DuckValue>>,
}

impl Statement for DuckDbStatement {
    fn parameter_count(&self) -> usize {
        self.bound.len()
    }

    fn bind(&mut self, index: usize, value: &Value) -> EngineResult<()> {
        let count = self.bound.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.bound.get_mut(i))
            .ok_or_else(|| {
                EngineError::validation(format!(
                    "Parameter index {index} out of range (statement has {count} placeholders)"
                ))
            })?;
        *slot = Some(value_to_duckdb(value));
        Ok(())
    }

    fn query(&mut self) -> EngineResult<Box<dyn Cursor>> {
        let bound_count = self.bound.iter().filter(|v| v.is_some()).count();
        if bound_count != self.bound.len() {
            return Err(EngineError::parameter_mismatch(self.bound.len(), bound_count));
        }
        let params: Vec<DuckValue> = self.bound.iter().flatten().cloned().collect();

        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&self.sql)
            .map_err(|e| EngineError::classify(e.to_string()))?;

        // DuckDB crate: column_count/column_name panic before execution, so
        // rows are collected first and the column metadata read afterwards.
        let rows_iter = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let col_count = row.as_ref().column_count();
                let values: Vec<Value> = (0..col_count)
                    .map(|i| duckdb_value_to_value(row, i))
                    .collect();
                Ok(Row { values })
            })
            .map_err(|e| EngineError::classify(e.to_string()))?;

        let mut rows = Vec::new();
        for row_result in rows_iter {
            let row = row_result.map_err(|e| EngineError::execution_error(e.to_string()))?;
            rows.push(row);
        }

        let column_count = stmt.column_count();
        let columns: Vec<ColumnInfo> = (0..column_count)
            .map(|i| ColumnInfo {
                name: stmt
                    .column_name(i)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|_| format!("col_{i}")),
                data_type: format!("{:?}", stmt.column_type(i)),
                nullable: true,
            })
            .collect();

        Ok(Box::new(DuckDbCursor {
            columns,
            rows: rows.into_iter(),
        }))
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        Ok(())
    }
}

/// Forward-only cursor over a drained DuckDB result.
pub struct DuckDbCursor {
    columns: Vec<ColumnInfo>,
    rows: std::vec::IntoIter<Row>,
}

impl Iterator for DuckDbCursor {
    type Item = EngineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next().map(Ok)
    }
}

impl Cursor for DuckDbCursor {
    fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }
}

// ==================== Type Conversion ====================

/// Converts a Value to a DuckDB Value for parameter binding.
fn value_to_duckdb(value: &Value) -> DuckValue {
    match value {
        Value::Null => DuckValue::Null,
        Value::Bool(b) => DuckValue::Boolean(*b),
        Value::Int(i) => DuckValue::BigInt(*i),
        Value::Float(f) => DuckValue::Double(*f),
        Value::Text(s) => DuckValue::Text(s.clone()),
        Value::Bytes(b) => DuckValue::Blob(b.clone()),
        Value::Json(j) => DuckValue::Text(j.to_string()),
        Value::Array(arr) => DuckValue::Text(serde_json::to_string(arr).unwrap_or_default()),
    }
}

/// Extracts a value from a DuckDB row.
fn duckdb_value_to_value(row: &::duckdb::Row<'_>, idx: usize) -> Value {
    match row.get::<_, DuckValue>(idx) {
        Ok(value) => from_duckdb(value),
        Err(e) => {
            debug!(column = idx, error = %e, "Unreadable DuckDB value, returning NULL");
            Value::Null
        }
    }
}

/// Converts an owned DuckDB value.
///
/// Integers wider than `i64` and decimals are returned as exact text.
/// Dates, times and timestamps are returned as ISO text (timestamps in UTC).
fn from_duckdb(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::Int(i64::from(i)),
        DuckValue::SmallInt(i) => Value::Int(i64::from(i)),
        DuckValue::Int(i) => Value::Int(i64::from(i)),
        DuckValue::BigInt(i) => Value::Int(i),
        DuckValue::HugeInt(i) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(i.to_string())),
        DuckValue::UTinyInt(i) => Value::Int(i64::from(i)),
        DuckValue::USmallInt(i) => Value::Int(i64::from(i)),
        DuckValue::UInt(i) => Value::Int(i64::from(i)),
        DuckValue::UBigInt(i) => i64::try_from(i)
            .map(Value::Int)
            .unwrap_or_else(|_| Value::Text(i.to_string())),
        DuckValue::Float(f) => Value::Float(f64::from(f)),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => Value::Text(d.to_string()),
        DuckValue::Text(s) | DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Blob(b) => Value::Bytes(b),
        DuckValue::Date32(days) => format_date(days),
        DuckValue::Timestamp(unit, v) => format_timestamp(split_epoch(unit, v), v),
        DuckValue::Time64(unit, v) => format_time(split_epoch(unit, v), v),
        DuckValue::Interval { months, days, nanos } => Value::Json(serde_json::json!({
            "months": months,
            "days": days,
            "nanos": nanos,
        })),
        DuckValue::List(items) | DuckValue::Array(items) => {
            Value::Array(items.into_iter().map(from_duckdb).collect())
        }
        DuckValue::Union(inner) => from_duckdb(*inner),
        other => Value::Text(format!("{other:?}")),
    }
}

/// Splits a value in `unit` into whole seconds and sub-second nanoseconds.
fn split_epoch(unit: TimeUnit, value: i64) -> (i64, u32) {
    let per_second: i64 = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    let nanos_per_tick = 1_000_000_000 / per_second;
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * nanos_per_tick;
    (secs, nanos as u32)
}

fn format_date(days_since_epoch: i32) -> Value {
    days_since_epoch
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| Value::Text(d.format("%Y-%m-%d").to_string()))
        .unwrap_or(Value::Int(i64::from(days_since_epoch)))
}

fn format_timestamp((secs, nanos): (i64, u32), raw: i64) -> Value {
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| Value::Text(dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string()))
        .unwrap_or(Value::Int(raw))
}

fn format_time((secs, nanos): (i64, u32), raw: i64) -> Value {
    u32::try_from(secs)
        .ok()
        .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|t| Value::Text(t.format("%H:%M:%S%.f").to_string()))
        .unwrap_or(Value::Int(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> ConnectionProperties {
        ConnectionProperties::new("duckdb", ":memory:")
    }

    #[test]
    fn test_connect_memory() {
        let conn = DuckDbConnector::new().connect(&memory()).unwrap();
        conn.close().unwrap();
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = DuckDbConnector::new()
            .connect(&ConnectionProperties::new("duckdb", "  "))
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::ConnectionFailed { .. }));
    }

    #[test]
    fn invalid_option_is_rejected() {
        // Depending on the DuckDB version the flag is refused when set or when opening.
        let props = memory().with_option("threads", "not-a-number");
        let err = DuckDbConnector::new().connect(&props).err().unwrap();
        assert!(matches!(
            err,
            EngineError::ValidationError { .. } | EngineError::ConnectionFailed { .. }
        ));
    }

    #[test]
    fn prepare_reports_placeholder_count() {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let stmt = conn.prepare("SELECT ?::INTEGER + ?::INTEGER AS total").unwrap();
        assert_eq!(stmt.parameter_count(), 2);
        stmt.close().unwrap();
        conn.close().unwrap();
    }

    #[test]
    fn prepare_surfaces_syntax_errors() {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let err = conn.prepare("SELEC 1").err().unwrap();
        assert!(matches!(err, EngineError::SyntaxError { .. }));
        conn.close().unwrap();
    }

    #[test]
    fn bound_query_yields_rows_and_columns() {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let mut stmt = conn
            .prepare("SELECT ?::INTEGER AS id, ?::VARCHAR AS name")
            .unwrap();
        stmt.bind(1, &Value::Int(7)).unwrap();
        stmt.bind(2, &Value::Text("seven".into())).unwrap();

        let mut cursor = stmt.query().unwrap();
        let names: Vec<&str> = cursor.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name"]);

        let row = cursor.next().unwrap().unwrap();
        assert_eq!(row.values, vec![Value::Int(7), Value::Text("seven".into())]);
        assert!(cursor.next().is_none());

        drop(cursor);
        stmt.close().unwrap();
        conn.close().unwrap();
    }

    #[test]
    fn unbound_placeholders_fail_with_mismatch() {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let mut stmt = conn.prepare("SELECT ?::INTEGER, ?::INTEGER").unwrap();
        stmt.bind(1, &Value::Int(1)).unwrap();

        let err = stmt.query().err().unwrap();
        assert_eq!(err, EngineError::parameter_mismatch(2, 1));
    }

    fn select_row(sql: &str) -> Vec<Value> {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let mut stmt = conn.prepare(sql).unwrap();
        let row = stmt.query().unwrap().next().unwrap().unwrap();
        stmt.close().unwrap();
        conn.close().unwrap();
        row.values
    }

    #[test]
    fn non_integer_columns_keep_their_values() {
        let values = select_row(
            "SELECT 1.5::DOUBLE, 2.25::FLOAT, 12.50::DECIMAL(10,2), 42::BIGINT, \
             true, NULL::INTEGER, 'x'::BLOB",
        );
        assert_eq!(
            values,
            vec![
                Value::Float(1.5),
                Value::Float(2.25),
                Value::Text("12.50".into()),
                Value::Int(42),
                Value::Bool(true),
                Value::Null,
                Value::Bytes(b"x".to_vec()),
            ]
        );
    }

    #[test]
    fn temporal_columns_are_iso_text() {
        let values = select_row(
            "SELECT DATE '2020-01-02', TIMESTAMP '2020-01-02 03:04:05', \
             TIMESTAMP '1969-12-31 23:59:59.5', TIME '03:04:05'",
        );
        assert_eq!(
            values,
            vec![
                Value::Text("2020-01-02".into()),
                Value::Text("2020-01-02 03:04:05".into()),
                Value::Text("1969-12-31 23:59:59.500".into()),
                Value::Text("03:04:05".into()),
            ]
        );
    }

    #[test]
    fn epoch_split_handles_negative_values() {
        assert_eq!(split_epoch(TimeUnit::Microsecond, -500_000), (-1, 500_000_000));
        assert_eq!(split_epoch(TimeUnit::Millisecond, 1_250), (1, 250_000_000));
        assert_eq!(split_epoch(TimeUnit::Second, 7), (7, 0));
        assert_eq!(format_date(18_263), Value::Text("2020-01-02".into()));
    }

    #[test]
    fn wide_integers_fall_back_to_exact_text() {
        assert_eq!(
            from_duckdb(DuckValue::HugeInt(i128::from(i64::MAX) + 1)),
            Value::Text("9223372036854775808".into())
        );
        assert_eq!(
            from_duckdb(DuckValue::UBigInt(u64::MAX)),
            Value::Text(u64::MAX.to_string())
        );
    }

    #[test]
    fn out_of_range_bind_is_rejected() {
        let mut conn = DuckDbConnector::new().connect(&memory()).unwrap();
        let mut stmt = conn.prepare("SELECT ?::INTEGER").unwrap();
        assert!(stmt.bind(0, &Value::Int(1)).is_err());
        assert!(stmt.bind(2, &Value::Int(1)).is_err());
        assert!(stmt.bind(1, &Value::Int(1)).is_ok());
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Connectivity traits
//!
//! The federation layer talks to physical backends exclusively through these
//! traits. They mirror the classic connect / prepare / bind / query lifecycle
//! and are synchronous: every call may block on I/O.

use crate::engine::error::EngineResult;
use crate::engine::types::{ColumnInfo, ConnectionProperties, Row, Value};

/// Opens physical connections for one driver.
///
/// Connectors are shared between threads; every `connect` call must return a
/// brand new connection (no pooling, no reuse).
pub trait Connector: Send + Sync {
    /// Returns the unique identifier for this driver (e.g., "duckdb")
    fn driver_id(&self) -> &'static str;

    /// Returns a human-readable name for this driver
    fn driver_name(&self) -> &'static str;

    /// Opens a new connection using the given properties
    fn connect(&self, properties: &ConnectionProperties) -> EngineResult<Box<dyn Connection>>;
}

/// One open physical connection.
pub trait Connection: Send {
    /// Prepares `sql` on this connection.
    ///
    /// Syntax and semantic errors are expected to surface here.
    fn prepare(&mut self, sql: &str) -> EngineResult<Box<dyn Statement>>;

    /// Closes the connection and releases its handle.
    fn close(self: Box<Self>) -> EngineResult<()>;
}

/// A prepared statement with positional placeholders.
pub trait Statement: Send {
    /// Number of placeholders in the prepared SQL
    fn parameter_count(&self) -> usize;

    /// Binds `value` to the placeholder at `index` (1-based).
    ///
    /// Indexes outside `1..=parameter_count()` are rejected.
    fn bind(&mut self, index: usize, value: &Value) -> EngineResult<()>;

    /// Executes the statement as a query.
    ///
    /// Fails with `EngineError::ParameterMismatch` while any placeholder is unbound.
    fn query(&mut self) -> EngineResult<Box<dyn Cursor>>;

    /// Closes the statement.
    fn close(self: Box<Self>) -> EngineResult<()>;
}

/// Forward-only result cursor.
///
/// Yields rows lazily; once exhausted it cannot be restarted.
pub trait Cursor: Iterator<Item = EngineResult<Row>> + Send {
    /// Column descriptors of the result
    fn columns(&self) -> &[ColumnInfo];
}

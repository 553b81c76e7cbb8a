// SPDX-License-Identifier: Apache-2.0

//! Federated executor.
//!
//! Runs one physical SQL statement against one shard on a freshly opened
//! connection and owns the statement + connection pair until it is released.
//!
//! Release always closes the statement before the connection and attempts
//! both, even when the first close fails. Resources are reclaimed on every
//! exit path: explicitly through [`FederatedExecutor::release`], through
//! [`FederatedExecutor::execute_scoped`], or when the executor is dropped.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::registry::DriverRegistry;
use crate::engine::traits::{Connection, Connector, Cursor, Statement};
use crate::engine::types::{ColumnInfo, ConnectionProperties, Row, Value};
use crate::metrics;

use super::error::{FederationError, FederationResult};

/// Statement and connection held open for a live cursor.
struct OpenStatement {
    statement: Box<dyn Statement>,
    connection: Box<dyn Connection>,
}

impl OpenStatement {
    fn close(self) -> FederationResult<()> {
        let statement = self.statement.close().err();
        let connection = self.connection.close().err();
        match (statement, connection) {
            (None, None) => Ok(()),
            (statement, connection) => Err(FederationError::Release {
                statement,
                connection,
            }),
        }
    }
}

/// Executes physical SQL against one shard.
///
/// Not reentrant: one executor runs at most one statement at a time.
pub struct FederatedExecutor {
    id: Uuid,
    connector: Arc<dyn Connector>,
    properties: ConnectionProperties,
    open: Option<OpenStatement>,
}

impl FederatedExecutor {
    pub fn new(connector: Arc<dyn Connector>, properties: ConnectionProperties) -> Self {
        Self {
            id: Uuid::new_v4(),
            connector,
            properties,
            open: None,
        }
    }

    /// Creates an executor using the connector registered for `properties.driver`.
    pub fn from_registry(
        registry: &DriverRegistry,
        properties: ConnectionProperties,
    ) -> FederationResult<Self> {
        let connector = registry.require(&properties.driver)?;
        Ok(Self::new(connector, properties))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn properties(&self) -> &ConnectionProperties {
        &self.properties
    }

    /// Whether a statement is currently held open.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Opens a connection, prepares `sql`, binds `parameters` positionally
    /// (1-based, in order) and runs it as a query.
    ///
    /// The returned cursor borrows the executor, so the statement and the
    /// connection stay open for as long as the cursor is alive.
    #[instrument(
        skip(self, sql, parameters),
        fields(executor = %self.id, driver = %self.properties.driver, params = parameters.len())
    )]
    pub fn execute(&mut self, sql: &str, parameters: &[Value]) -> FederationResult<ResultCursor<'_>> {
        if self.open.is_some() {
            return Err(FederationError::ExecutorBusy);
        }

        let start = Instant::now();
        let result = self.open_statement(sql, parameters);
        metrics::record_execution(start.elapsed().as_secs_f64() * 1000.0, result.is_ok());

        let (open, cursor) = result.map_err(FederationError::Execution)?;
        self.open = Some(open);
        debug!("Statement executed");
        Ok(ResultCursor {
            inner: cursor,
            _executor: PhantomData,
        })
    }

    /// Runs `sql`, hands the cursor to `consume`, then releases.
    ///
    /// Release happens whether `consume` returns normally or unwinds; a
    /// release failure after a successful `consume` is reported as the error.
    pub fn execute_scoped<R>(
        &mut self,
        sql: &str,
        parameters: &[Value],
        consume: impl FnOnce(&mut ResultCursor<'_>) -> R,
    ) -> FederationResult<R> {
        let mut guard = ReleaseGuard { executor: self };
        let outcome = {
            let mut cursor = guard.executor.execute(sql, parameters)?;
            consume(&mut cursor)
        };
        guard.executor.release()?;
        Ok(outcome)
    }

    /// Closes the open statement, then its connection.
    ///
    /// Both closes are attempted; failures are aggregated into
    /// `FederationError::Release`. A no-op when nothing is open.
    #[instrument(skip(self), fields(executor = %self.id))]
    pub fn release(&mut self) -> FederationResult<()> {
        let Some(open) = self.open.take() else {
            return Ok(());
        };
        let result = open.close();
        metrics::record_release(result.is_ok());
        result
    }

    fn open_statement(
        &self,
        sql: &str,
        parameters: &[Value],
    ) -> EngineResult<(OpenStatement, Box<dyn Cursor>)> {
        let mut connection = self.connector.connect(&self.properties)?;

        let statement = match connection.prepare(sql) {
            Ok(statement) => statement,
            Err(e) => {
                if let Err(close_err) = connection.close() {
                    warn!(error = %close_err, "Failed to close connection after prepare error");
                }
                return Err(e);
            }
        };

        let mut open = OpenStatement {
            statement,
            connection,
        };
        match bind_and_query(open.statement.as_mut(), parameters) {
            Ok(cursor) => Ok((open, cursor)),
            Err(e) => {
                if let Err(release_err) = open.close() {
                    warn!(error = %release_err, "Failed to release after execution error");
                }
                Err(e)
            }
        }
    }
}

fn bind_and_query(statement: &mut dyn Statement, parameters: &[Value]) -> EngineResult<Box<dyn Cursor>> {
    let expected = statement.parameter_count();
    if parameters.len() != expected {
        return Err(EngineError::parameter_mismatch(expected, parameters.len()));
    }
    for (index, value) in parameters.iter().enumerate() {
        statement.bind(index + 1, value)?;
    }
    statement.query()
}

impl Drop for FederatedExecutor {
    fn drop(&mut self) {
        if let Some(open) = self.open.take() {
            let result = open.close();
            metrics::record_release(result.is_ok());
            if let Err(e) = result {
                warn!(executor = %self.id, error = %e, "Release on drop failed");
            }
        }
    }
}

/// Releases the executor when a scoped consumer unwinds.
struct ReleaseGuard<'a> {
    executor: &'a mut FederatedExecutor,
}

impl Drop for ReleaseGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.executor.release() {
            warn!(executor = %self.executor.id, error = %e, "Scoped release failed");
        }
    }
}

/// Forward-only cursor over one executed statement.
///
/// Borrows its executor: the statement cannot be released while rows are
/// still being read.
pub struct ResultCursor<'a> {
    inner: Box<dyn Cursor>,
    _executor: PhantomData<&'a mut FederatedExecutor>,
}

impl ResultCursor<'_> {
    pub fn columns(&self) -> &[ColumnInfo] {
        self.inner.columns()
    }
}

impl Iterator for ResultCursor<'_> {
    type Item = EngineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

// SPDX-License-Identifier: Apache-2.0

//! Errors raised by the federation layer.
//!
//! Unmapped native column types are not an error: they degrade to
//! `LogicalType::Unknown` (see `type_mapper`).

use serde::Serialize;
use thiserror::Error;

use crate::engine::error::EngineError;

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
pub enum FederationError {
    /// The representative shard's metadata could not be loaded.
    #[error("Failed to load table metadata from {node}: {reason}")]
    MetadataLoad { node: String, reason: String },

    /// Connectivity, SQL or parameter-binding failure during execution.
    #[error("Execution failed: {0}")]
    Execution(#[source] EngineError),

    /// Closing the statement and/or the connection failed. Both closes were
    /// attempted; each field holds the corresponding failure, if any.
    #[error("Failed to release resources: {}", release_summary(.statement, .connection))]
    Release {
        statement: Option<EngineError>,
        connection: Option<EngineError>,
    },

    /// `execute` was called while a previous statement is still open.
    #[error("Executor already holds an open statement; release it first")]
    ExecutorBusy,

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl FederationError {
    pub fn metadata_load(node: impl ToString, reason: impl Into<String>) -> Self {
        Self::MetadataLoad {
            node: node.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config { message: msg.into() }
    }
}

impl From<EngineError> for FederationError {
    fn from(err: EngineError) -> Self {
        Self::Execution(err)
    }
}

fn release_summary(statement: &Option<EngineError>, connection: &Option<EngineError>) -> String {
    match (statement, connection) {
        (Some(s), Some(c)) => format!("statement: {s}; connection: {c}"),
        (Some(s), None) => format!("statement: {s}"),
        (None, Some(c)) => format!("connection: {c}"),
        (None, None) => "no error".to_string(),
    }
}

/// Result type alias for federation operations
pub type FederationResult<T> = Result<T, FederationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_error_reports_both_failures() {
        let err = FederationError::Release {
            statement: Some(EngineError::internal("stmt gone")),
            connection: Some(EngineError::connection_failed("socket closed")),
        };
        let msg = err.to_string();
        assert!(msg.contains("statement: Internal error: stmt gone"));
        assert!(msg.contains("connection: Connection failed: socket closed"));
    }

    #[test]
    fn execution_error_keeps_driver_error_as_source() {
        let err: FederationError = EngineError::parameter_mismatch(1, 0).into();
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "Parameter count mismatch: statement expects 1, got 0"
        );
    }
}

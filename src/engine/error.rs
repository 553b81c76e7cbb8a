// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the driver layer
//!
//! All driver-specific errors are mapped to these unified error types so the
//! federation layer can surface them verbatim regardless of the backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all driver operations
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Query syntax error: {message}")]
    SyntaxError { message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("Parameter count mismatch: statement expects {expected}, got {actual}")]
    ParameterMismatch { expected: usize, actual: usize },

    #[error("Driver not found: {driver_id}")]
    DriverNotFound { driver_id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Feature not supported: {message}")]
    NotSupported { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

impl EngineError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::SyntaxError { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn parameter_mismatch(expected: usize, actual: usize) -> Self {
        Self::ParameterMismatch { expected, actual }
    }

    pub fn driver_not_found(id: impl Into<String>) -> Self {
        Self::DriverNotFound { driver_id: id.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }

    /// Classifies a raw driver message into a syntax or execution error.
    pub fn classify(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let lower = msg.to_lowercase();
        if lower.contains("syntax") || lower.contains("parser") {
            Self::syntax_error(msg)
        } else {
            Self::execution_error(msg)
        }
    }
}

/// Result type alias for driver operations
pub type EngineResult<T> = Result<T, EngineError>;

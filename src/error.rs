//! Error types for athena-query.
//!
//! Defines the main error enum used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Main error type for query operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AthenaError {
    /// The execution reached FAILED. The reason is the service's message, verbatim.
    #[error("Query execution failed: {reason}")]
    ExecutionFailed { reason: String },

    /// The execution reached CANCELLED.
    #[error("Query execution was cancelled")]
    ExecutionCancelled,

    /// The result set had no rows at all, not even a header.
    #[error("Result set is empty: no header row")]
    EmptyResultSet,

    /// Transport or service-level failure (submit, status check, page fetch).
    #[error("Service error: {0}")]
    Service(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller's cancellation token fired before the query finished.
    #[error("Query aborted by caller")]
    Aborted,

    /// The client-level deadline elapsed before the query finished.
    #[error("Query timed out after {0:?}")]
    TimedOut(Duration),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AthenaError {
    /// Creates an execution-failed error with the given reason.
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            reason: reason.into(),
        }
    }

    /// Creates a service error with the given message.
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ExecutionFailed { .. } => "Execution Failed",
            Self::ExecutionCancelled => "Execution Cancelled",
            Self::EmptyResultSet => "Empty Result Set",
            Self::Service(_) => "Service Error",
            Self::Config(_) => "Configuration Error",
            Self::Aborted => "Aborted",
            Self::TimedOut(_) => "Timed Out",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using AthenaError.
pub type Result<T> = std::result::Result<T, AthenaError>;

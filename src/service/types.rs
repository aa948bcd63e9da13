//! Wire-level types exchanged with the execution service.
//!
//! Defines the handle, status, and result page structures that flow between
//! the query client and an [`ExecutionService`](super::ExecutionService).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AthenaError;

/// Opaque identifier of one submitted execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    /// Wraps a service-issued execution id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw execution id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of an execution as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Returns the state as its upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Returns true for SUCCEEDED, FAILED and CANCELLED.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued | Self::Running)
    }
}

impl FromStr for ExecutionState {
    type Err = AthenaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Ok(Self::Queued),
            "RUNNING" => Ok(Self::Running),
            "SUCCEEDED" => Ok(Self::Succeeded),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(AthenaError::service(format!(
                "Unknown execution state: {s}"
            ))),
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status observation: the state plus an optional reason (FAILED only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub state: ExecutionState,
    pub reason: Option<String>,
}

impl ExecutionStatus {
    pub fn queued() -> Self {
        Self::from(ExecutionState::Queued)
    }

    pub fn running() -> Self {
        Self::from(ExecutionState::Running)
    }

    pub fn succeeded() -> Self {
        Self::from(ExecutionState::Succeeded)
    }

    pub fn cancelled() -> Self {
        Self::from(ExecutionState::Cancelled)
    }

    /// A FAILED status carrying the service's reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            state: ExecutionState::Failed,
            reason: Some(reason.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

impl From<ExecutionState> for ExecutionStatus {
    fn from(state: ExecutionState) -> Self {
        Self {
            state,
            reason: None,
        }
    }
}

/// One positional row as delivered by the service. `None` is NULL.
pub type RawRow = Vec<Option<String>>;

/// One page of a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub rows: Vec<RawRow>,
    /// Cursor for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

impl ResultPage {
    /// Creates a final page (no continuation token).
    pub fn last(rows: Vec<RawRow>) -> Self {
        Self {
            rows,
            next_token: None,
        }
    }

    /// Creates a page followed by another one.
    pub fn with_next(rows: Vec<RawRow>, token: impl Into<String>) -> Self {
        Self {
            rows,
            next_token: Some(token.into()),
        }
    }
}

/// Whether the service may answer from a previous execution's results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultReusePolicy {
    pub enabled: bool,
    #[serde(default)]
    pub max_age_minutes: Option<u32>,
}

/// Maximum age of reusable results when reuse is on by default.
pub const DEFAULT_REUSE_MAX_AGE_MINUTES: u32 = 60;

impl ResultReusePolicy {
    /// Reuse turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_age_minutes: None,
        }
    }

    /// Reuse of results up to `minutes` old.
    pub fn max_age(minutes: u32) -> Self {
        Self {
            enabled: true,
            max_age_minutes: Some(minutes),
        }
    }
}

impl Default for ResultReusePolicy {
    fn default() -> Self {
        Self::max_age(DEFAULT_REUSE_MAX_AGE_MINUTES)
    }
}

/// Everything the service needs to start an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub query: String,
    pub database: String,
    pub catalog: String,
    pub workgroup: String,
    pub result_reuse: ResultReusePolicy,
}

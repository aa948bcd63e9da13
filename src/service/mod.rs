//! Execution service abstraction.
//!
//! Provides a trait-based interface to the remote query service so the
//! polling and pagination logic can run against the HTTP client or a
//! scripted in-memory double interchangeably.

mod http;
mod mock;
mod types;

pub use http::{HttpExecutionService, HttpServiceConfig};
pub use mock::{ScriptedExecutionService, ServiceCall};
pub use types::{
    ExecutionHandle, ExecutionState, ExecutionStatus, RawRow, ResultPage, ResultReusePolicy,
    SubmitRequest, DEFAULT_REUSE_MAX_AGE_MINUTES,
};

use crate::error::Result;
use async_trait::async_trait;

/// Trait defining the operations of an asynchronous query-execution service.
///
/// Implementations hold no per-query state and must be safe to share across
/// concurrent queries.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    /// Starts an execution and returns its handle.
    async fn start_query(&self, request: &SubmitRequest) -> Result<ExecutionHandle>;

    /// Returns the current status of an execution.
    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus>;

    /// Fetches one page of a completed execution's results.
    ///
    /// `next_token` is `None` for the first page.
    async fn get_results_page(
        &self,
        handle: &ExecutionHandle,
        next_token: Option<&str>,
    ) -> Result<ResultPage>;
}

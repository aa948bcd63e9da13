//! Query client.
//!
//! Submits a query, waits for the execution to finish, and returns its
//! result set as records.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{cancellable, map_rows, ExecutionPoller, QueryContext, Record, ResultPaginator};
use crate::config::Config;
use crate::error::{AthenaError, Result};
use crate::query::poller::DEFAULT_POLL_INTERVAL;
use crate::service::{ExecutionService, ExecutionState, HttpExecutionService};

/// Client that runs SQL against an asynchronous execution service.
///
/// Cloning is cheap; clones share the service connection and context.
/// Concurrent calls are independent of each other.
#[derive(Clone)]
pub struct QueryClient {
    service: Arc<dyn ExecutionService>,
    context: Arc<QueryContext>,
    poll_interval: Duration,
    query_timeout: Option<Duration>,
}

impl QueryClient {
    /// Creates a client with the default poll interval and no deadline.
    pub fn new(service: Arc<dyn ExecutionService>, context: QueryContext) -> Self {
        Self {
            service,
            context: Arc::new(context),
            poll_interval: DEFAULT_POLL_INTERVAL,
            query_timeout: None,
        }
    }

    /// Creates an HTTP-backed client from resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let service = HttpExecutionService::new(config.service.to_http_config()?)?;
        let client = Self::new(Arc::new(service), config.query.to_context()?)
            .with_poll_interval(config.query.poll_interval()?);
        Ok(match config.query.timeout() {
            Some(limit) => client.with_query_timeout(limit),
            None => client,
        })
    }

    /// Sets the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Fails every call that takes longer than `limit` with `TimedOut`.
    pub fn with_query_timeout(mut self, limit: Duration) -> Self {
        self.query_timeout = Some(limit);
        self
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    /// Runs `sql` and returns its result set as records.
    ///
    /// Fails with `ExecutionFailed` or `ExecutionCancelled` when the execution
    /// does not succeed, and with `EmptyResultSet` when it returns no header.
    pub async fn query(&self, sql: &str) -> Result<Vec<Record>> {
        self.query_with_cancel(sql, &CancellationToken::new()).await
    }

    /// Like [`query`](Self::query), but gives up with `Aborted` once `cancel`
    /// fires. The remote execution is left running.
    pub async fn query_with_cancel(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Record>> {
        match self.query_timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(sql, cancel))
                .await
                .map_err(|_| AthenaError::TimedOut(limit))?,
            None => self.run(sql, cancel).await,
        }
    }

    async fn run(&self, sql: &str, cancel: &CancellationToken) -> Result<Vec<Record>> {
        let start = Instant::now();
        let request = self.context.submit_request(sql);
        let handle = cancellable(cancel, self.service.start_query(&request)).await?;
        info!(
            "Submitted execution {} (database={}, workgroup={})",
            handle, request.database, request.workgroup
        );

        let status = ExecutionPoller::new(self.service.as_ref(), self.poll_interval)
            .await_completion(&handle, cancel)
            .await?;

        match status.state {
            ExecutionState::Succeeded => {}
            ExecutionState::Failed => {
                let reason = status
                    .reason
                    .unwrap_or_else(|| "unknown reason".to_string());
                warn!("Execution {} failed: {}", handle, reason);
                return Err(AthenaError::ExecutionFailed { reason });
            }
            ExecutionState::Cancelled => {
                warn!("Execution {} was cancelled", handle);
                return Err(AthenaError::ExecutionCancelled);
            }
            ExecutionState::Queued | ExecutionState::Running => {
                return Err(AthenaError::internal(format!(
                    "Execution {} stopped polling in non-terminal state {}",
                    handle, status.state
                )));
            }
        }

        let rows = ResultPaginator::new(self.service.as_ref())
            .fetch_all(&handle, cancel)
            .await?;
        let records = map_rows(&rows)?;

        info!(
            "Execution {} returned {} records in {:?}",
            handle,
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("context", &self.context)
            .field("poll_interval", &self.poll_interval)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

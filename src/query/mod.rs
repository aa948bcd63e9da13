//! Query execution for athena-query.
//!
//! Submission, status polling, result pagination and row mapping. The
//! [`QueryClient`] drives the other pieces for one query at a time.

pub mod client;
pub mod context;
pub mod mapper;
pub mod paginator;
pub mod poller;
pub mod record;

pub use client::QueryClient;
pub use context::{QueryContext, DEFAULT_WORKGROUP};
pub use mapper::map_rows;
pub use paginator::ResultPaginator;
pub use poller::{ExecutionPoller, DEFAULT_POLL_INTERVAL};
pub use record::Record;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{AthenaError, Result};

/// Runs `fut` unless `cancel` fires first, in which case it fails with `Aborted`.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => Err(AthenaError::Aborted),
        result = fut => result,
    }
}

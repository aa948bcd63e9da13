//! Execution status polling.
//!
//! Drives a submitted execution to a terminal state by checking its status
//! at a fixed interval.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::cancellable;
use crate::error::Result;
use crate::service::{ExecutionHandle, ExecutionService, ExecutionState, ExecutionStatus};

/// Delay between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls an execution until it reaches SUCCEEDED, FAILED or CANCELLED.
pub struct ExecutionPoller<'a> {
    service: &'a dyn ExecutionService,
    interval: Duration,
}

impl<'a> ExecutionPoller<'a> {
    /// Creates a poller that waits `interval` between checks.
    pub fn new(service: &'a dyn ExecutionService, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Waits for the execution to finish and returns its terminal status.
    ///
    /// There is no iteration limit. A failed status check ends the wait with
    /// that error; firing `cancel` ends it with `Aborted`.
    pub async fn await_completion(
        &self,
        handle: &ExecutionHandle,
        cancel: &CancellationToken,
    ) -> Result<ExecutionStatus> {
        let mut status = cancellable(cancel, self.service.get_status(handle)).await?;

        while !status.is_terminal() {
            debug!("Execution {} is {}", handle, status.state);

            cancellable(cancel, async {
                tokio::time::sleep(self.interval).await;
                Ok(())
            })
            .await?;

            let next = cancellable(cancel, self.service.get_status(handle)).await?;
            if status.state == ExecutionState::Running && next.state == ExecutionState::Queued {
                debug!("Execution {} went back to QUEUED", handle);
            }
            status = next;
        }

        debug!("Execution {} finished as {}", handle, status.state);
        Ok(status)
    }
}

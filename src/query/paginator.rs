//! Result set pagination.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::cancellable;
use crate::error::Result;
use crate::service::{ExecutionHandle, ExecutionService, RawRow};

/// Collects every page of a finished execution's result set.
pub struct ResultPaginator<'a> {
    service: &'a dyn ExecutionService,
}

impl<'a> ResultPaginator<'a> {
    pub fn new(service: &'a dyn ExecutionService) -> Self {
        Self { service }
    }

    /// Fetches pages one after another until the service stops returning a
    /// continuation token, and returns all rows in delivery order.
    pub async fn fetch_all(
        &self,
        handle: &ExecutionHandle,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = cancellable(
                cancel,
                self.service
                    .get_results_page(handle, next_token.as_deref()),
            )
            .await?;
            pages += 1;
            rows.extend(page.rows);

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(
            "Fetched {} rows in {} pages for execution {}",
            rows.len(),
            pages,
            handle
        );
        Ok(rows)
    }
}

//! Scripted execution service for testing.
//!
//! Replays a predefined sequence of status observations and serves result
//! pages keyed by continuation token, recording every call it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ExecutionHandle, ExecutionService, ExecutionStatus, RawRow, ResultPage, SubmitRequest};
use crate::error::{AthenaError, Result};

/// A call received by [`ScriptedExecutionService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Submit(SubmitRequest),
    GetStatus(ExecutionHandle),
    GetResultsPage {
        handle: ExecutionHandle,
        next_token: Option<String>,
    },
}

/// A deterministic in-memory execution service.
///
/// Status observations are consumed in order; once the script runs out the
/// last observation repeats, so a terminal state stays terminal. Pages are
/// looked up by the requested token, which keeps concurrent queries against
/// one instance independent.
#[derive(Debug, Default)]
pub struct ScriptedExecutionService {
    statuses: Mutex<VecDeque<Result<ExecutionStatus>>>,
    last_status: Mutex<Option<ExecutionStatus>>,
    pages: HashMap<Option<String>, Result<ResultPage>>,
    submit_error: Option<AthenaError>,
    calls: Mutex<Vec<ServiceCall>>,
    next_id: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedExecutionService {
    /// Creates a service with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends status observations to the script.
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = ExecutionStatus>) -> Self {
        lock(&self.statuses).extend(statuses.into_iter().map(Ok));
        self
    }

    /// Appends a failing status check to the script.
    pub fn with_status_error(self, msg: impl Into<String>) -> Self {
        lock(&self.statuses).push_back(Err(AthenaError::service(msg)));
        self
    }

    /// Serves `page` when the given token (or `None` for the first page) is requested.
    pub fn with_page(mut self, token: Option<&str>, page: ResultPage) -> Self {
        self.pages.insert(token.map(String::from), Ok(page));
        self
    }

    /// Chains `pages` so that page *i* points at page *i + 1* via `"token-{i+1}"`.
    pub fn with_pages(mut self, pages: impl IntoIterator<Item = Vec<RawRow>>) -> Self {
        let pages: Vec<_> = pages.into_iter().collect();
        let count = pages.len();
        for (i, rows) in pages.into_iter().enumerate() {
            let token = (i > 0).then(|| format!("token-{i}"));
            let page = if i + 1 < count {
                ResultPage::with_next(rows, format!("token-{}", i + 1))
            } else {
                ResultPage::last(rows)
            };
            self.pages.insert(token, Ok(page));
        }
        self
    }

    /// Fails the fetch for the given token.
    pub fn with_page_error(mut self, token: Option<&str>, msg: impl Into<String>) -> Self {
        self.pages
            .insert(token.map(String::from), Err(AthenaError::service(msg)));
        self
    }

    /// Fails every submission.
    pub fn with_submit_error(mut self, msg: impl Into<String>) -> Self {
        self.submit_error = Some(AthenaError::service(msg));
        self
    }

    /// Returns every call received so far, in order.
    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.calls).clone()
    }

    /// Number of status checks received.
    pub fn status_calls(&self) -> usize {
        self.count(|c| matches!(c, ServiceCall::GetStatus(_)))
    }

    /// Continuation tokens of the page fetches received, in order.
    pub fn page_requests(&self) -> Vec<Option<String>> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                ServiceCall::GetResultsPage { next_token, .. } => Some(next_token.clone()),
                _ => None,
            })
            .collect()
    }

    /// Submissions received, in order.
    pub fn submissions(&self) -> Vec<SubmitRequest> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                ServiceCall::Submit(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&ServiceCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: ServiceCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ExecutionService for ScriptedExecutionService {
    async fn start_query(&self, request: &SubmitRequest) -> Result<ExecutionHandle> {
        self.record(ServiceCall::Submit(request.clone()));
        if let Some(err) = &self.submit_error {
            return Err(err.clone());
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionHandle::new(format!("exec-{id}")))
    }

    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        self.record(ServiceCall::GetStatus(handle.clone()));

        let next = lock(&self.statuses).pop_front();
        match next {
            Some(Ok(status)) => {
                *lock(&self.last_status) = Some(status.clone());
                Ok(status)
            }
            Some(Err(err)) => Err(err),
            None => lock(&self.last_status)
                .clone()
                .ok_or_else(|| AthenaError::service("No status scripted")),
        }
    }

    async fn get_results_page(
        &self,
        handle: &ExecutionHandle,
        next_token: Option<&str>,
    ) -> Result<ResultPage> {
        let next_token = next_token.map(String::from);
        self.record(ServiceCall::GetResultsPage {
            handle: handle.clone(),
            next_token: next_token.clone(),
        });

        self.pages.get(&next_token).cloned().unwrap_or_else(|| {
            Err(AthenaError::service(format!(
                "No page scripted for token {next_token:?}"
            )))
        })
    }
}

//! Per-client query settings.

use crate::service::{ResultReusePolicy, SubmitRequest};

/// Workgroup used when none is configured.
pub const DEFAULT_WORKGROUP: &str = "primary";

/// Where and how every query of one client runs.
///
/// Built once when the client is constructed and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryContext {
    database: String,
    catalog: String,
    workgroup: String,
    result_reuse: ResultReusePolicy,
}

impl QueryContext {
    /// Creates a context with the default workgroup and result reuse (on, 60 minutes).
    pub fn new(database: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            catalog: catalog.into(),
            workgroup: DEFAULT_WORKGROUP.to_string(),
            result_reuse: ResultReusePolicy::default(),
        }
    }

    /// Overrides the workgroup.
    pub fn with_workgroup(mut self, workgroup: impl Into<String>) -> Self {
        self.workgroup = workgroup.into();
        self
    }

    /// Overrides the result reuse policy.
    pub fn with_result_reuse(mut self, policy: ResultReusePolicy) -> Self {
        self.result_reuse = policy;
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn workgroup(&self) -> &str {
        &self.workgroup
    }

    pub fn result_reuse(&self) -> ResultReusePolicy {
        self.result_reuse
    }

    /// Builds the submission for `sql` under this context.
    pub fn submit_request(&self, sql: &str) -> SubmitRequest {
        SubmitRequest {
            query: sql.to_string(),
            database: self.database.clone(),
            catalog: self.catalog.clone(),
            workgroup: self.workgroup.clone(),
            result_reuse: self.result_reuse,
        }
    }
}

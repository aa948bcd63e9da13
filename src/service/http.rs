//! HTTP execution service implementation.
//!
//! Implements the ExecutionService trait over the Athena JSON protocol:
//! every action is a POST to one endpoint, selected by the `X-Amz-Target`
//! header. Request signing is left to the endpoint (a signing proxy or a
//! local emulator); an optional bearer token is sent for gateways.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{AthenaError, Result};
use crate::service::{
    ExecutionHandle, ExecutionService, ExecutionState, ExecutionStatus, ResultPage,
    ResultReusePolicy, SubmitRequest,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Target prefix for every action.
const TARGET_PREFIX: &str = "AmazonAthena";

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// HTTP service configuration.
#[derive(Debug, Clone)]
pub struct HttpServiceConfig {
    /// Service endpoint, e.g. `https://athena.us-east-1.amazonaws.com/`.
    pub endpoint: String,
    /// Bearer token sent as `Authorization`, if any.
    pub bearer_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl HttpServiceConfig {
    /// Creates a new config for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bearer_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Execution service speaking the Athena JSON protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpExecutionService {
    config: HttpServiceConfig,
    client: Client,
}

impl HttpExecutionService {
    /// Creates a new service client with the given configuration.
    pub fn new(config: HttpServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AthenaError::service(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Sends one action and decodes its response body.
    async fn call<Req, Resp>(&self, action: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!("{} request to {}", action, self.config.endpoint);

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .header("Content-Type", CONTENT_TYPE)
            .json(body);
        if let Some(token) = &self.config.bearer_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AthenaError::service(format!("{action} timed out"))
            } else if e.is_connect() {
                AthenaError::service(format!(
                    "Failed to connect to {}: {}",
                    self.config.endpoint, e
                ))
            } else {
                AthenaError::service(format!("{action} request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AthenaError::service(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| AthenaError::service(format!("Failed to parse {action} response: {e}")))
    }

    /// Turns a non-2xx response into a service error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> AthenaError {
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(body) {
            if let Some(message) = error.message {
                let kind = error.kind.unwrap_or_else(|| status.to_string());
                return AthenaError::service(format!("{kind}: {message}"));
            }
        }

        AthenaError::service(format!("Service returned {}: {}", status, body))
    }

    fn start_request(request: &SubmitRequest) -> StartQueryExecutionRequest<'_> {
        StartQueryExecutionRequest {
            query_string: &request.query,
            query_execution_context: QueryExecutionContext {
                database: &request.database,
                catalog: &request.catalog,
            },
            work_group: &request.workgroup,
            result_reuse_configuration: ResultReuseConfiguration::from(request.result_reuse),
        }
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn start_query(&self, request: &SubmitRequest) -> Result<ExecutionHandle> {
        let response: StartQueryExecutionResponse = self
            .call("StartQueryExecution", &Self::start_request(request))
            .await?;
        Ok(ExecutionHandle::new(response.query_execution_id))
    }

    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        let response: GetQueryExecutionResponse = self
            .call(
                "GetQueryExecution",
                &ExecutionIdRequest {
                    query_execution_id: handle.as_str(),
                    next_token: None,
                },
            )
            .await?;
        response.query_execution.status.try_into()
    }

    async fn get_results_page(
        &self,
        handle: &ExecutionHandle,
        next_token: Option<&str>,
    ) -> Result<ResultPage> {
        let response: GetQueryResultsResponse = self
            .call(
                "GetQueryResults",
                &ExecutionIdRequest {
                    query_execution_id: handle.as_str(),
                    next_token,
                },
            )
            .await?;
        Ok(response.into())
    }
}

// Athena API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionRequest<'a> {
    query_string: &'a str,
    query_execution_context: QueryExecutionContext<'a>,
    work_group: &'a str,
    result_reuse_configuration: ResultReuseConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionContext<'a> {
    database: &'a str,
    catalog: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultReuseConfiguration {
    result_reuse_by_age_configuration: ResultReuseByAgeConfiguration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultReuseByAgeConfiguration {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_age_in_minutes: Option<u32>,
}

impl From<ResultReusePolicy> for ResultReuseConfiguration {
    fn from(policy: ResultReusePolicy) -> Self {
        Self {
            result_reuse_by_age_configuration: ResultReuseByAgeConfiguration {
                enabled: policy.enabled,
                max_age_in_minutes: policy.max_age_minutes,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionResponse {
    query_execution_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ExecutionIdRequest<'a> {
    query_execution_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecutionResponse {
    query_execution: QueryExecution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecution {
    status: QueryExecutionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionStatus {
    state: String,
    #[serde(default)]
    state_change_reason: Option<String>,
}

impl TryFrom<QueryExecutionStatus> for ExecutionStatus {
    type Error = AthenaError;

    fn try_from(status: QueryExecutionStatus) -> Result<Self> {
        let state: ExecutionState = status.state.parse()?;
        let reason = match state {
            ExecutionState::Failed => status.state_change_reason,
            _ => None,
        };
        Ok(Self { state, reason })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsResponse {
    result_set: ResultSet,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultSet {
    #[serde(default)]
    rows: Vec<ApiRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ApiRow {
    #[serde(default)]
    data: Vec<Datum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Datum {
    #[serde(default)]
    var_char_value: Option<String>,
}

impl From<GetQueryResultsResponse> for ResultPage {
    fn from(response: GetQueryResultsResponse) -> Self {
        let rows = response
            .result_set
            .rows
            .into_iter()
            .map(|row| row.data.into_iter().map(|d| d.var_char_value).collect())
            .collect();
        Self {
            rows,
            // Some gateways send "" rather than omitting the field on the last page.
            next_token: response.next_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

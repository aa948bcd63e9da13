//! Configuration management for athena-query.
//!
//! Handles loading configuration from TOML files and environment variables:
//! how to reach the execution service, and the database, catalog, workgroup
//! and result reuse settings every query runs with.

use crate::error::{AthenaError, Result};
use crate::query::{QueryContext, DEFAULT_POLL_INTERVAL, DEFAULT_WORKGROUP};
use crate::service::{HttpServiceConfig, ResultReusePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Execution service connection settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Settings shared by every query.
    #[serde(default)]
    pub query: QuerySettings,
}

/// Execution service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service endpoint URL.
    pub endpoint: Option<String>,

    /// Bearer token for gateways (not recommended to store in config).
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Validates the endpoint and builds the HTTP client configuration.
    pub fn to_http_config(&self) -> Result<HttpServiceConfig> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| AthenaError::config("Service endpoint is required"))?;

        let url = Url::parse(endpoint)
            .map_err(|e| AthenaError::config(format!("Invalid endpoint '{endpoint}': {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AthenaError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        let mut config = HttpServiceConfig::new(url.as_str()).with_timeout(self.request_timeout_secs);
        if let Some(token) = &self.token {
            config = config.with_bearer_token(token.clone());
        }
        Ok(config)
    }
}

/// Result reuse as written in the config file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultReuseConfig {
    #[serde(default = "default_reuse_enabled")]
    pub enabled: bool,

    pub max_age_minutes: Option<u32>,
}

fn default_reuse_enabled() -> bool {
    true
}

impl From<ResultReuseConfig> for ResultReusePolicy {
    fn from(config: ResultReuseConfig) -> Self {
        match (config.enabled, config.max_age_minutes) {
            (false, _) => ResultReusePolicy::disabled(),
            (true, Some(minutes)) => ResultReusePolicy::max_age(minutes),
            (true, None) => ResultReusePolicy::default(),
        }
    }
}

/// Settings shared by every query of a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Target database.
    pub database: Option<String>,

    /// Target data catalog. Defaults to "AwsDataCatalog".
    pub catalog: Option<String>,

    /// Workgroup override. Defaults to "primary".
    pub workgroup: Option<String>,

    /// Result reuse override. Defaults to enabled, 60 minutes.
    pub result_reuse: Option<ResultReuseConfig>,

    /// Delay between status checks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall deadline per query, in seconds. Unset means no deadline.
    pub timeout_secs: Option<u64>,
}

/// Catalog used when none is configured.
pub const DEFAULT_CATALOG: &str = "AwsDataCatalog";

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            database: None,
            catalog: None,
            workgroup: None,
            result_reuse: None,
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: None,
        }
    }
}

impl QuerySettings {
    /// Builds the immutable query context.
    pub fn to_context(&self) -> Result<QueryContext> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| AthenaError::config("Database name is required"))?;

        let mut context = QueryContext::new(database, self.effective_catalog());
        if let Some(workgroup) = &self.workgroup {
            context = context.with_workgroup(workgroup.as_str());
        }
        if let Some(reuse) = self.result_reuse {
            context = context.with_result_reuse(reuse.into());
        }
        Ok(context)
    }

    /// Returns the poll interval. Zero is rejected: it would poll without pause.
    pub fn poll_interval(&self) -> Result<Duration> {
        if self.poll_interval_ms == 0 {
            return Err(AthenaError::config("poll_interval_ms must be at least 1"));
        }
        Ok(Duration::from_millis(self.poll_interval_ms))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Returns the catalog that will be used.
    pub fn effective_catalog(&self) -> &str {
        self.catalog.as_deref().unwrap_or(DEFAULT_CATALOG)
    }

    /// Returns the workgroup that will be used.
    pub fn effective_workgroup(&self) -> &str {
        self.workgroup.as_deref().unwrap_or(DEFAULT_WORKGROUP)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-query")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AthenaError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            AthenaError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies environment variables (ATHENA_ENDPOINT, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        self.apply_defaults_from(|key| std::env::var(key).ok());
    }

    fn apply_defaults_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.service.endpoint.is_none() {
            self.service.endpoint = lookup("ATHENA_ENDPOINT");
        }
        if self.service.token.is_none() {
            self.service.token = lookup("ATHENA_TOKEN");
        }
        if self.query.database.is_none() {
            self.query.database = lookup("ATHENA_DATABASE");
        }
        if self.query.catalog.is_none() {
            self.query.catalog = lookup("ATHENA_CATALOG");
        }
        if self.query.workgroup.is_none() {
            self.query.workgroup = lookup("ATHENA_WORKGROUP");
        }
    }

    /// Returns a display-safe summary (no token) for logging.
    pub fn display_string(&self) -> String {
        let endpoint = self.service.endpoint.as_deref().unwrap_or("unset");
        let database = self.query.database.as_deref().unwrap_or("unknown");
        format!(
            "{}.{} @ {} (workgroup {})",
            self.query.effective_catalog(),
            database,
            endpoint,
            self.query.effective_workgroup()
        )
    }
}

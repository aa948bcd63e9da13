//! Command-line argument parsing for athena-query.
//!
//! Uses clap to parse CLI arguments and layer them over the config file.

use athena_query::config::{Config, ResultReuseConfig};
use clap::Parser;
use std::path::PathBuf;

/// Run one SQL query against an asynchronous query service and print the records as JSON.
#[derive(Parser, Debug)]
#[command(name = "athena-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL to execute
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Service endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Target database
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Target data catalog
    #[arg(short = 'C', long, value_name = "CATALOG")]
    pub catalog: Option<String>,

    /// Workgroup to run in
    #[arg(short = 'w', long, value_name = "WORKGROUP")]
    pub workgroup: Option<String>,

    /// Disable result reuse
    #[arg(long, conflicts_with = "reuse_max_age")]
    pub no_reuse: bool,

    /// Maximum age of reused results, in minutes
    #[arg(long, value_name = "MINUTES")]
    pub reuse_max_age: Option<u32>,

    /// Delay between status checks, in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to a file instead of stderr (default location if no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI arguments on top of the loaded config. CLI wins.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(endpoint) = &self.endpoint {
            config.service.endpoint = Some(endpoint.clone());
        }
        if let Some(database) = &self.database {
            config.query.database = Some(database.clone());
        }
        if let Some(catalog) = &self.catalog {
            config.query.catalog = Some(catalog.clone());
        }
        if let Some(workgroup) = &self.workgroup {
            config.query.workgroup = Some(workgroup.clone());
        }
        if self.no_reuse {
            config.query.result_reuse = Some(ResultReuseConfig {
                enabled: false,
                max_age_minutes: None,
            });
        } else if let Some(minutes) = self.reuse_max_age {
            config.query.result_reuse = Some(ResultReuseConfig {
                enabled: true,
                max_age_minutes: Some(minutes),
            });
        }
        if let Some(ms) = self.poll_interval_ms {
            config.query.poll_interval_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.query.timeout_secs = Some(secs);
        }
    }
}

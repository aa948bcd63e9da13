//! athena-query - an async client for out-of-process SQL query services.
//!
//! A query is submitted to the service, polled until it reaches a terminal
//! state, and its paginated result set is fetched and mapped into records
//! keyed by column name.

pub mod config;
pub mod error;
pub mod logging;
pub mod query;
pub mod service;

pub use error::{AthenaError, Result};
pub use query::{QueryClient, QueryContext, Record};

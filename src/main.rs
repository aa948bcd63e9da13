//! athena-query - run one SQL query against an asynchronous query service.

mod cli;

use athena_query::config::Config;
use athena_query::error::{AthenaError, Result};
use athena_query::logging;
use athena_query::query::{QueryClient, Record};
use cli::Cli;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => {
            let path = path.clone().unwrap_or_else(logging::default_log_path);
            logging::init_file_logging(&path);
        }
        None => logging::init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Precedence: CLI arguments, then config file, then environment.
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    cli.apply_to(&mut config);
    config.apply_env_defaults();
    info!("Target: {}", config.display_string());

    let client = QueryClient::from_config(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning query");
            on_interrupt.cancel();
        }
    });

    let records = client.query_with_cancel(&cli.sql, &cancel).await?;
    print_records(&records, cli.pretty)
}

fn print_records(records: &[Record], pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(records)
    } else {
        serde_json::to_string(records)
    }
    .map_err(|e| AthenaError::internal(format!("Failed to encode records: {e}")))?;

    println!("{output}");
    Ok(())
}

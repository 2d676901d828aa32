//! Wordsprout binary entry point.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wordsprout::cli::{self, Cli};

const DEFAULT_LOG_FILTER: &str = "wordsprout=info,tower_http=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli::run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

use anyhow::Result;
use clap::Parser;
use memory_cli::{logger, run, Cli};

const DEFAULT_LOG_FILE: &str = "logs/cmem.log";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_file = std::env::var("CMEM_LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    logger::init_tracing(&log_file)?;

    run(Cli::parse()).await
}

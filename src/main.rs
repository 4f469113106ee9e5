//! Pincer - local AI assistant
//!
//! CLI entry point.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    let Some(command) = cli.command else {
        return cli::print_help();
    };

    let config = server::load_config()?;
    let _log_guard = server::init_tracing(&config.logging)?;

    info!("Starting Pincer v{}", env!("CARGO_PKG_VERSION"));
    if !std::path::Path::new(".env").exists() {
        warn!(".env file not found; using config files and environment only");
    }

    if let Err(e) = server::validate_config(&config) {
        anyhow::bail!("{}", pincer_core::format_error_for_cli(&e));
    }

    cli::run(command, config).await
}

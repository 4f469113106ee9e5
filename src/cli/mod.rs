//! CLI module for Pincer
//!
//! Provides commands:
//! - `serve`: run the Telegram channel and the scheduler
//! - `chat`: interactive terminal session against the same pipeline
//! - `status`: show the effective configuration and tools

use crate::server::config::AppConfig;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod status;

/// Pincer local assistant CLI
#[derive(Parser, Debug)]
#[command(name = "pincer")]
#[command(about = "Local AI assistant with a security-gated tool pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the bot and scheduler
    Serve,
    /// Chat in the terminal
    Chat {
        /// Identity to chat as (defaults to the first allowlisted user)
        #[arg(long)]
        user: Option<String>,
    },
    /// Show configuration, backend and tools
    Status {
        /// Print the merged configuration as TOML instead
        #[arg(long)]
        show_config: bool,
    },
}

/// Print help when no subcommand is given
pub fn print_help() -> anyhow::Result<()> {
    let mut cmd = <Cli as clap::CommandFactory>::command();
    cmd.print_help()?;
    println!();
    Ok(())
}

/// Run the CLI command
pub async fn run(command: Commands, config: AppConfig) -> anyhow::Result<()> {
    match command {
        Commands::Serve => crate::server::run(config).await,
        Commands::Chat { user } => chat::run(config, user).await,
        Commands::Status { show_config } => status::run(&config, show_config),
    }
}

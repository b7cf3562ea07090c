// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Food Ordering CLI
//!
//! The `foodctl` binary runs the HTTP API and the operator tasks around it.
//!
//! ## Commands
//!
//! - `foodctl serve [--seed]` - Run the HTTP API
//! - `foodctl seed` - Load the demo data set into the configured storage
//! - `foodctl token <username>` - Issue a bearer token for an existing user
//! - `foodctl migrate [--dry-run]` - Apply pending database migrations
//! - `foodctl config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use food_ordering::commands::{self, ConfigCommand, MigrateCommand};
use food_ordering::server;

/// Multi-tenant food ordering backend
#[derive(Parser)]
#[command(name = "foodctl")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, env = "FOOD_CONFIG_PATH", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "FOOD_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    #[command(name = "serve")]
    Serve {
        /// Load the demo data set before accepting requests
        #[arg(long)]
        seed: bool,

        /// HTTP port (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Load the demo data set and print a token per demo user
    #[command(name = "seed")]
    Seed,

    /// Issue a bearer token for an existing user
    #[command(name = "token")]
    Token {
        #[arg(value_name = "USERNAME")]
        username: String,
    },

    /// Apply pending database migrations
    #[command(name = "migrate")]
    Migrate {
        #[command(flatten)]
        command: MigrateCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Serve { seed, port }) => server::start_server(cli.config, port, seed).await,
        Some(Commands::Seed) => commands::seed::seed(cli.config).await,
        Some(Commands::Token { username }) => commands::seed::token(cli.config, &username).await,
        Some(Commands::Migrate { command }) => commands::migrate::execute(command, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}

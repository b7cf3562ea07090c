// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use food_ordering_core::domain::config::{ServerConfig, StorageKind};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate a configuration file with default values
    Generate {
        /// Output path
        #[arg(short, long, default_value = "./food-config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, force } => generate(&output, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. FOOD_CONFIG_PATH: {}",
            std::env::var("FOOD_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./food-config.yaml");
        println!("  4. ~/.food-ordering/config.yaml");
        println!();
    }

    let config = ServerConfig::load_or_default(config_override).context("Failed to load configuration")?;
    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    println!("{}", "Server:".bold());
    println!("  Listen: {}", config.listen_address());
    println!("  Event capacity: {}", spec.server.event_capacity);
    println!();

    println!("{}", "Storage:".bold());
    match spec.storage.backend {
        StorageKind::Memory => println!("  Backend: memory"),
        StorageKind::Postgres => {
            println!("  Backend: postgres");
            println!(
                "  Database URL: {}",
                if spec.storage.database_url.is_some() { "(set)" } else { "(missing)" }
            );
            println!("  Max connections: {}", spec.storage.max_connections);
        }
    }
    println!();

    println!("{}", "Auth:".bold());
    println!("  Token TTL: {} minutes", spec.auth.token_ttl_minutes);
    println!();

    println!("{}", "Logging:".bold());
    println!("  Level: {}", spec.logging.level);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());
    Ok(())
}

fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    ServerConfig::default()
        .to_yaml_file(output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!("{}", format!("✓ Configuration generated: {}", output.display()).green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_round_trips_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("food-config.yaml");

        generate(&path, false).unwrap();
        let config = ServerConfig::from_yaml_file(&path).unwrap();
        config.validate().unwrap();

        assert!(generate(&path, false).is_err());
        generate(&path, true).unwrap();
    }
}

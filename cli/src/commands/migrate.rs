// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Migrate Command
//!
//! Applies the embedded schema migrations to the configured PostgreSQL
//! database.
//!
//! ```bash
//! # Apply all pending migrations
//! foodctl migrate
//!
//! # Preview migrations without applying
//! foodctl migrate --dry-run
//! ```
//!
//! The database URL comes from `spec.storage.database_url` or the
//! `FOOD_DATABASE_URL` environment variable.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use food_ordering_core::domain::config::ServerConfig;
use food_ordering_core::infrastructure::db::{Database, MIGRATOR};

#[derive(Args)]
pub struct MigrateCommand {
    /// Perform a dry run without applying changes
    #[arg(long)]
    dry_run: bool,
}

pub async fn execute(cmd: MigrateCommand, config_path: Option<PathBuf>) -> Result<()> {
    println!("{}", "Food Ordering Migrate".bold().green());

    let config = ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let database_url = config
        .spec
        .storage
        .database_url
        .context("No database configured. Set spec.storage.database_url or FOOD_DATABASE_URL.")?;

    println!("Connecting to database...");
    let database = Database::new(&database_url, 1).await?;

    let applied_count = database.applied_migrations().await?;
    let total_migrations = MIGRATOR.iter().count();
    println!(
        "Migration status: {} applied, {} total available.",
        applied_count, total_migrations
    );

    if applied_count >= total_migrations {
        println!("{}", "✓ Database is up to date.".green());
        return Ok(());
    }

    if cmd.dry_run {
        println!("Pending migrations found (Dry Run):");
        for migration in MIGRATOR.iter().skip(applied_count) {
            println!(" - {} {}", migration.version, migration.description);
        }
        println!("Skipping application due to --dry-run");
        return Ok(());
    }

    println!("Applying pending migrations...");
    let applied = database.migrate().await?;
    println!("{}", format!("✓ Applied {applied} migration(s).").green());
    Ok(())
}

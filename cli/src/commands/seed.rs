// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `seed` and `token` commands.
//!
//! Both work against the configured storage backend. With the in-memory
//! backend the seeded data disappears when the command exits, so use
//! `foodctl serve --seed` there instead.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

use food_ordering_core::application::create_repositories;
use food_ordering_core::application::seed::seed_demo_data;
use food_ordering_core::domain::config::{ServerConfig, StorageKind};
use food_ordering_core::domain::identity::IdentityProvider;
use food_ordering_core::domain::user::User;
use food_ordering_core::infrastructure::JwtIdentityProvider;

pub async fn seed(config_path: Option<PathBuf>) -> Result<()> {
    let config = ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;
    if config.spec.storage.backend == StorageKind::Memory {
        warn!("Seeding the in-memory backend; the data is discarded when this command exits");
    }

    let repositories = create_repositories(&config.storage_backend()).await?;
    let data = seed_demo_data(&repositories)
        .await
        .context("Failed to seed demo data")?;

    println!(
        "{}",
        format!(
            "✓ Seeded {} users, {} restaurants, {} menu items, {} orders",
            data.users.len(),
            data.restaurants.len(),
            data.items.len(),
            data.orders.len()
        )
        .green()
    );
    println!();

    let identity = JwtIdentityProvider::new(
        &config.spec.auth.jwt_secret,
        config.spec.auth.token_ttl_minutes,
        repositories.users.clone(),
    );
    print_tokens(&identity, &data.users)
}

pub async fn token(config_path: Option<PathBuf>, username: &str) -> Result<()> {
    let config = ServerConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    let repositories = create_repositories(&config.storage_backend()).await?;
    let user = repositories
        .users
        .find_by_username(username)
        .await?
        .with_context(|| format!("No user named '{username}'"))?;
    if !user.is_active {
        anyhow::bail!("User '{username}' is inactive");
    }

    let identity = JwtIdentityProvider::new(
        &config.spec.auth.jwt_secret,
        config.spec.auth.token_ttl_minutes,
        Arc::clone(&repositories.users),
    );
    let token = identity.issue_token(&user).context("Failed to issue token")?;
    println!("{token}");
    Ok(())
}

/// One line per user: name, role, country and a fresh bearer token.
pub fn print_tokens(identity: &JwtIdentityProvider, users: &[User]) -> Result<()> {
    println!("{}", "Demo users:".bold());
    for user in users {
        let token = identity
            .issue_token(user)
            .with_context(|| format!("Failed to issue token for {}", user.username))?;
        let country = user.country.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<16} {:<8} {:<8} {}",
            user.username.bold(),
            user.role,
            country,
            token.dimmed()
        );
    }
    Ok(())
}

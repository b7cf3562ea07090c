// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype that is
//! injected into all PostgreSQL repository implementations. Schema migrations
//! are embedded from `backend/core/migrations`.

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(connection_string)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations. Returns how many were applied.
    pub async fn migrate(&self) -> Result<usize> {
        let applied_before = self.applied_migrations().await?;
        MIGRATOR
            .run(&self.pool)
            .await
            .context("Failed to apply migrations")?;
        let applied = MIGRATOR.iter().count().saturating_sub(applied_before);
        if applied > 0 {
            info!("Applied {} database migration(s)", applied);
        }
        Ok(applied)
    }

    /// Number of migrations already recorded, 0 on a database that has never
    /// been migrated.
    pub async fn applied_migrations(&self) -> Result<usize> {
        let tracked: bool = sqlx::query_scalar("SELECT to_regclass('_sqlx_migrations') IS NOT NULL")
            .fetch_one(&self.pool)
            .await
            .context("Failed to inspect migration state")?;
        if !tracked {
            return Ok(0);
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read applied migrations")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

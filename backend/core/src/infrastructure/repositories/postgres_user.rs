// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL User Repository
//!
//! `UserRepository` backed by the `users` table. Deleting a user cascades to
//! their orders and payment methods through foreign keys; restaurants they
//! own keep existing with `owner_id` cleared.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::decode;
use super::scope::SqlScope;
use crate::domain::actor::Country;
use crate::domain::ids::UserId;
use crate::domain::repository::{RepositoryError, UserRepository};
use crate::domain::resource::Predicate;
use crate::domain::user::User;

const COLUMNS: &str =
    "t.id, t.username, t.email, t.role, t.country, t.is_active, t.password_hash, t.created_at, t.updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let role: String = row.try_get("role")?;
    let country: Option<String> = row.try_get("country")?;
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        role: decode(&role, "users.role")?,
        country: country
            .map(|c| decode::<Country>(&c, "users.country"))
            .transpose()?,
        is_active: row.try_get("is_active")?,
        password_hash: row.try_get("password_hash")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, role, country, is_active, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                role = EXCLUDED.role,
                country = EXCLUDED.country,
                is_active = EXCLUDED.is_active,
                password_hash = EXCLUDED.password_hash,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.0)
        .bind(&user.username)
        .bind(&user.email)
        .bind(user.role.as_str())
        .bind(user.country.map(|c| c.as_str()))
        .bind(user.is_active)
        .bind(user.password_hash.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users t WHERE t.id = $1"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users t WHERE t.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_in_scope(&self, id: UserId, scope: &Predicate) -> Result<Option<User>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!("SELECT {COLUMNS} FROM users t WHERE t.id = $1 AND {}", scope.clause);
        let row = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self, scope: &Predicate) -> Result<Vec<User>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 1);
        let sql = format!("SELECT {COLUMNS} FROM users t WHERE {} ORDER BY t.username", scope.clause);
        let rows = scope.bind(sqlx::query(&sql)).fetch_all(&self.pool).await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {id}")));
        }
        Ok(())
    }
}

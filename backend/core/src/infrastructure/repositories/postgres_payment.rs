// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Payment Method Repository
//!
//! Every write that may flag a default runs in a transaction that first locks
//! the owner's `users` row, so concurrent default switches for one owner are
//! serialized. The partial unique index `uq_payment_methods_one_default`
//! backs the same rule at the schema level.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use super::scope::SqlScope;
use crate::domain::ids::{PaymentMethodId, UserId};
use crate::domain::payment::{PaymentMethod, PaymentType};
use crate::domain::repository::{PaymentMethodRepository, RepositoryError};
use crate::domain::resource::Predicate;

const COLUMNS: &str = "t.id, t.user_id, t.payment_type, t.is_default, t.card_last4, t.card_brand, \
     t.upi_id, t.created_at, t.updated_at";

pub struct PostgresPaymentMethodRepository {
    pool: PgPool,
}

impl PostgresPaymentMethodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn method_from_row(row: &PgRow) -> Result<PaymentMethod, RepositoryError> {
    let payment_type: String = row.try_get("payment_type")?;
    Ok(PaymentMethod {
        id: PaymentMethodId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        payment_type: PaymentType::parse(&payment_type).ok_or_else(|| {
            RepositoryError::Corrupt(format!("payment_methods.payment_type: {payment_type}"))
        })?,
        is_default: row.try_get("is_default")?,
        card_last4: row.try_get("card_last4")?,
        card_brand: row.try_get("card_brand")?,
        upi_id: row.try_get("upi_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn lock_owner(tx: &mut Transaction<'_, Postgres>, owner: UserId) -> Result<(), RepositoryError> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(owner.0)
        .fetch_optional(&mut **tx)
        .await?
        .map(|_| ())
        .ok_or_else(|| RepositoryError::Conflict(format!("user {owner} does not exist")))
}

async fn clear_defaults(
    tx: &mut Transaction<'_, Postgres>,
    owner: UserId,
    except: PaymentMethodId,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE payment_methods SET is_default = FALSE, updated_at = NOW() \
         WHERE user_id = $1 AND id <> $2 AND is_default",
    )
    .bind(owner.0)
    .bind(except.0)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl PaymentMethodRepository for PostgresPaymentMethodRepository {
    async fn create(&self, method: &PaymentMethod) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, method.user_id).await?;
        if method.is_default {
            clear_defaults(&mut tx, method.user_id, method.id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payment_methods (
                id, user_id, payment_type, is_default, card_last4, card_brand, upi_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(method.id.0)
        .bind(method.user_id.0)
        .bind(method.payment_type.as_str())
        .bind(method.is_default)
        .bind(&method.card_last4)
        .bind(&method.card_brand)
        .bind(&method.upi_id)
        .bind(method.created_at)
        .bind(method.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, method: &PaymentMethod) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        lock_owner(&mut tx, method.user_id).await?;
        if method.is_default {
            clear_defaults(&mut tx, method.user_id, method.id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE payment_methods SET
                payment_type = $2,
                is_default = $3,
                card_last4 = $4,
                card_brand = $5,
                upi_id = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(method.id.0)
        .bind(method.payment_type.as_str())
        .bind(method.is_default)
        .bind(&method.card_last4)
        .bind(&method.card_brand)
        .bind(&method.upi_id)
        .bind(method.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("payment method {}", method.id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: PaymentMethodId,
        scope: &Predicate,
    ) -> Result<Option<PaymentMethod>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!("SELECT {COLUMNS} FROM payment_methods t WHERE t.id = $1 AND {}", scope.clause);
        let row = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(method_from_row).transpose()
    }

    async fn list(&self, scope: &Predicate) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 1);
        let sql = format!(
            "SELECT {COLUMNS} FROM payment_methods t WHERE {} ORDER BY t.created_at DESC",
            scope.clause
        );
        let rows = scope.bind(sqlx::query(&sql)).fetch_all(&self.pool).await?;
        rows.iter().map(method_from_row).collect()
    }

    async fn set_default(&self, id: PaymentMethodId) -> Result<PaymentMethod, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owner: uuid::Uuid = sqlx::query("SELECT user_id FROM payment_methods WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("payment method {id}")))?
            .try_get("user_id")?;
        let owner = UserId(owner);
        lock_owner(&mut tx, owner).await?;
        clear_defaults(&mut tx, owner, id).await?;

        let row = sqlx::query(&format!(
            "UPDATE payment_methods t SET is_default = TRUE, updated_at = NOW() \
             WHERE t.id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("payment method {id}")))?;
        let method = method_from_row(&row)?;

        tx.commit().await?;
        Ok(method)
    }

    async fn delete(&self, id: PaymentMethodId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM payment_methods WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("payment method {id}")));
        }
        Ok(())
    }
}

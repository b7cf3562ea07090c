// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Order Repository
//!
//! Orders live in `orders`, their lines in `order_items`. A new order and its
//! lines are written in one transaction; after that only the order row is
//! ever updated; lines and `total_minor` are never rewritten. Status moves
//! are conditional on the status they were read at, so two writers racing on
//! one order cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::collections::HashMap;
use uuid::Uuid;

use super::scope::SqlScope;
use super::{decode, like_pattern, money, unsigned};
use crate::domain::ids::{MenuItemId, OrderId, OrderItemId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::order::{Order, OrderFilter, OrderItem, OrderStatus};
use crate::domain::repository::{OrderRepository, RepositoryError, StatusSwap};
use crate::domain::resource::Predicate;
use crate::domain::search::search_term;

const ORDER_COLUMNS: &str = "t.id, t.user_id, t.restaurant_id, t.payment_method_id, t.status, t.country, \
     t.total_minor, t.delivery_address, t.special_instructions, t.created_at, t.updated_at";

const ITEM_COLUMNS: &str = "t.id, t.order_id, t.menu_item_id, t.quantity, t.price_minor, t.special_instructions";

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lines of `orders`, keyed by order id, in insertion order.
    async fn items_for(&self, orders: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
        if orders.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items t WHERE t.order_id = ANY($1) ORDER BY t.position"
        ))
        .bind(orders)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = item_from_row(row)?;
            grouped.entry(item.order_id.0).or_default().push(item);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<PgRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<Uuid> = rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()?;
        let mut items = self.items_for(&ids).await?;
        rows.iter()
            .map(|row| {
                let id: Uuid = row.try_get("id")?;
                order_from_row(row, items.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, RepositoryError> {
    Ok(OrderItem {
        id: OrderItemId(row.try_get("id")?),
        order_id: OrderId(row.try_get("order_id")?),
        menu_item_id: MenuItemId(row.try_get("menu_item_id")?),
        quantity: unsigned(row.try_get("quantity")?, "order_items.quantity")?,
        price: money(row.try_get("price_minor")?, "order_items.price_minor")?,
        special_instructions: row.try_get("special_instructions")?,
    })
}

fn order_from_row(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
    let status: String = row.try_get("status")?;
    let country: String = row.try_get("country")?;
    let payment_method: Option<Uuid> = row.try_get("payment_method_id")?;
    Ok(Order::restore(
        OrderId(row.try_get("id")?),
        UserId(row.try_get("user_id")?),
        RestaurantId(row.try_get("restaurant_id")?),
        decode(&status, "orders.status")?,
        decode(&country, "orders.country")?,
        money(row.try_get("total_minor")?, "orders.total_minor")?,
        row.try_get("delivery_address")?,
        payment_method.map(PaymentMethodId),
        row.try_get("special_instructions")?,
        items,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create_with_items(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, restaurant_id, payment_method_id, status, country,
                total_minor, delivery_address, special_instructions, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(order.id.0)
        .bind(order.user_id.0)
        .bind(order.restaurant_id.0)
        .bind(order.payment_method_id.map(|id| id.0))
        .bind(order.status().as_str())
        .bind(order.country().as_str())
        .bind(order.total_amount().minor())
        .bind(&order.delivery_address)
        .bind(&order.special_instructions)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items().iter().enumerate() {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| RepositoryError::Conflict(format!("quantity {} out of range", item.quantity)))?;
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, menu_item_id, quantity, price_minor, special_instructions, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.0)
            .bind(order.id.0)
            .bind(item.menu_item_id.0)
            .bind(quantity)
            .bind(item.price.minor())
            .bind(&item.special_instructions)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                delivery_address = $2,
                payment_method_id = $3,
                special_instructions = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(order.id.0)
        .bind(&order.delivery_address)
        .bind(order.payment_method_id.map(|id| id.0))
        .bind(&order.special_instructions)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }

    async fn swap_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2")
            .bind(id.0)
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 1 {
            return Ok(StatusSwap::Applied);
        }

        let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        match current {
            Some(status) => Ok(StatusSwap::Stale {
                current: decode(&status, "orders.status")?,
            }),
            None => Err(RepositoryError::NotFound(format!("order {id}"))),
        }
    }

    async fn find_in_scope(&self, id: OrderId, scope: &Predicate) -> Result<Option<Order>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders t WHERE t.id = $1 AND {}", scope.clause);
        let Some(row) = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.assemble(vec![row]).await?.pop())
    }

    async fn list(&self, scope: &Predicate, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 6);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders t \
             WHERE ($1::text IS NULL OR t.status = $1) \
             AND ($2::uuid IS NULL OR t.restaurant_id = $2) \
             AND ($3::uuid IS NULL OR t.user_id = $3) \
             AND ($4::text IS NULL OR t.country = $4) \
             AND ($5::text IS NULL \
                  OR EXISTS (SELECT 1 FROM users u WHERE u.id = t.user_id AND u.username ILIKE $5) \
                  OR EXISTS (SELECT 1 FROM restaurants r WHERE r.id = t.restaurant_id AND r.name ILIKE $5)) \
             AND {} \
             ORDER BY t.created_at DESC",
            scope.clause
        );
        let query = sqlx::query(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.restaurant_id.map(|id| id.0))
            .bind(filter.user_id.map(|id| id.0))
            .bind(filter.country.map(|c| c.as_str()))
            .bind(search_term(&filter.search).map(like_pattern));
        let rows = scope.bind(query).fetch_all(&self.pool).await?;
        self.assemble(rows).await
    }

    async fn list_items(&self, scope: &Predicate) -> Result<Vec<OrderItem>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 1);
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items t WHERE {} ORDER BY t.order_id, t.position",
            scope.clause
        );
        let rows = scope.bind(sqlx::query(&sql)).fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("order {id}")));
        }
        Ok(())
    }
}

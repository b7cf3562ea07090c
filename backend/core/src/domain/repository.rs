// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined in the domain layer, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `UserRepository` | `User` | `InMemoryStore`, `PostgresUserRepository` |
//! | `RestaurantRepository` | `Restaurant` | `InMemoryStore`, `PostgresCatalogRepository` |
//! | `MenuCategoryRepository` | `MenuCategory` | `InMemoryStore`, `PostgresCatalogRepository` |
//! | `MenuItemRepository` | `MenuItem` | `InMemoryStore`, `PostgresCatalogRepository` |
//! | `OrderRepository` | `Order` (+ `OrderItem`) | `InMemoryStore`, `PostgresOrderRepository` |
//! | `PaymentMethodRepository` | `PaymentMethod` | `InMemoryStore`, `PostgresPaymentMethodRepository` |
//!
//! Every scoped read takes a [`Predicate`] built by the policy engine. A record
//! that exists but fails the predicate is reported exactly like a missing one.
//!
//! ## Atomic writes
//!
//! `OrderRepository::create_with_items`, `OrderRepository::swap_status`,
//! `PaymentMethodRepository::create`, `PaymentMethodRepository::save` and
//! `PaymentMethodRepository::set_default` are single isolation units: readers
//! never observe an order without its lines, a status only moves from the
//! value it was read at, and an owner never has more than one default payment
//! method.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::catalog::{
    MenuCategory, MenuCategoryFilter, MenuItem, MenuItemFilter, Restaurant, RestaurantFilter,
};
use crate::domain::ids::{
    MenuCategoryId, MenuItemId, OrderId, PaymentMethodId, RestaurantId, UserId,
};
use crate::domain::order::{Order, OrderFilter, OrderItem, OrderStatus};
use crate::domain::payment::PaymentMethod;
use crate::domain::resource::Predicate;
use crate::domain::user::User;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert or update.
    async fn save(&self, user: &User) -> Result<(), RepositoryError>;

    /// Unscoped lookup, reserved for identity resolution.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_in_scope(&self, id: UserId, scope: &Predicate) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, scope: &Predicate) -> Result<Vec<User>, RepositoryError>;

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn save(&self, restaurant: &Restaurant) -> Result<(), RepositoryError>;

    async fn find_in_scope(
        &self,
        id: RestaurantId,
        scope: &Predicate,
    ) -> Result<Option<Restaurant>, RepositoryError>;

    /// Ordered by name. The filter only narrows what the scope admits.
    async fn list(
        &self,
        scope: &Predicate,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError>;

    /// Cascades to the restaurant's categories and items.
    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MenuCategoryRepository: Send + Sync {
    async fn save(&self, category: &MenuCategory) -> Result<(), RepositoryError>;

    async fn find_in_scope(
        &self,
        id: MenuCategoryId,
        scope: &Predicate,
    ) -> Result<Option<MenuCategory>, RepositoryError>;

    /// Ordered by `display_order`, then name.
    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuCategoryFilter,
    ) -> Result<Vec<MenuCategory>, RepositoryError>;

    /// Cascades to the category's items.
    async fn delete(&self, id: MenuCategoryId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait MenuItemRepository: Send + Sync {
    async fn save(&self, item: &MenuItem) -> Result<(), RepositoryError>;

    async fn find_in_scope(&self, id: MenuItemId, scope: &Predicate) -> Result<Option<MenuItem>, RepositoryError>;

    /// Ordered by name.
    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuItemFilter,
    ) -> Result<Vec<MenuItem>, RepositoryError>;

    async fn delete(&self, id: MenuItemId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist a new order and all of its lines as one unit.
    async fn create_with_items(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Update the editable fields of the order row. Status, lines and the
    /// total are not written here.
    async fn save(&self, order: &Order) -> Result<(), RepositoryError>;

    /// Move the order to `next` only while its stored status is still
    /// `expected`.
    async fn swap_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, RepositoryError>;

    async fn find_in_scope(&self, id: OrderId, scope: &Predicate) -> Result<Option<Order>, RepositoryError>;

    /// Newest first.
    async fn list(&self, scope: &Predicate, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Order lines visible under `scope` (an `OrderItem` predicate).
    async fn list_items(&self, scope: &Predicate) -> Result<Vec<OrderItem>, RepositoryError>;

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Insert. When the method is flagged default, the owner's other
    /// defaults are cleared in the same unit.
    async fn create(&self, method: &PaymentMethod) -> Result<(), RepositoryError>;

    /// Update with the same default exclusivity as `create`.
    async fn save(&self, method: &PaymentMethod) -> Result<(), RepositoryError>;

    async fn find_in_scope(
        &self,
        id: PaymentMethodId,
        scope: &Predicate,
    ) -> Result<Option<PaymentMethod>, RepositoryError>;

    /// Newest first.
    async fn list(&self, scope: &Predicate) -> Result<Vec<PaymentMethod>, RepositoryError>;

    /// Clear every default of the method's owner, then flag `id`. Returns the
    /// updated method.
    async fn set_default(&self, id: PaymentMethodId) -> Result<PaymentMethod, RepositoryError>;

    async fn delete(&self, id: PaymentMethodId) -> Result<(), RepositoryError>;
}

/// Result of [`OrderRepository::swap_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSwap {
    Applied,
    /// Another writer moved the order first.
    Stale { current: OrderStatus },
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on the storage backend
//! configuration. The domain layer defines the traits, infrastructure provides
//! the implementations, and this module wires one to the other.

use anyhow::Result;
use std::sync::Arc;
use sqlx::PgPool;

use crate::domain::repository::{
    MenuCategoryRepository, MenuItemRepository, OrderRepository, PaymentMethodRepository,
    RestaurantRepository, StorageBackend, UserRepository,
};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::postgres_catalog::PostgresCatalogRepository;
use crate::infrastructure::repositories::postgres_order::PostgresOrderRepository;
use crate::infrastructure::repositories::postgres_payment::PostgresPaymentMethodRepository;
use crate::infrastructure::repositories::postgres_user::PostgresUserRepository;
use crate::infrastructure::repositories::InMemoryStore;

/// One handle per aggregate repository, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub restaurants: Arc<dyn RestaurantRepository>,
    pub categories: Arc<dyn MenuCategoryRepository>,
    pub items: Arc<dyn MenuItemRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub payments: Arc<dyn PaymentMethodRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            restaurants: Arc::new(store.clone()),
            categories: Arc::new(store.clone()),
            items: Arc::new(store.clone()),
            orders: Arc::new(store.clone()),
            payments: Arc::new(store),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        let catalog = Arc::new(PostgresCatalogRepository::new(pool.clone()));
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            restaurants: catalog.clone(),
            categories: catalog.clone(),
            items: catalog,
            orders: Arc::new(PostgresOrderRepository::new(pool.clone())),
            payments: Arc::new(PostgresPaymentMethodRepository::new(pool)),
        }
    }
}

/// Creates the repository set for the configured backend. PostgreSQL
/// connects, applies pending migrations, then hands out pooled repositories.
pub async fn create_repositories(backend: &StorageBackend) -> Result<Repositories> {
    match backend {
        StorageBackend::InMemory => Ok(Repositories::in_memory()),
        StorageBackend::PostgreSQL(config) => {
            let database = Database::new(&config.connection_string, config.max_connections).await?;
            database.migrate().await?;
            Ok(Repositories::postgres(database.get_pool().clone()))
        }
    }
}

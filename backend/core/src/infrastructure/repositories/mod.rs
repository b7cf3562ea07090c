// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in the
//! domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresUserRepository** - Accounts
//! - **PostgresCatalogRepository** - Restaurants, menu categories and menu items
//! - **PostgresOrderRepository** - Orders and their lines, created in one transaction
//! - **PostgresPaymentMethodRepository** - Payment methods with row-locked default switching
//!
//! Scope predicates are rendered to SQL by [`scope::SqlScope`].
//!
//! ## In-Memory Store
//!
//! [`InMemoryStore`] implements every repository trait over one set of tables
//! behind a single `tokio::sync::RwLock`. A multi-step write holds the write
//! lock for its whole duration, which gives it the same all-or-nothing
//! visibility as a database transaction.

pub mod postgres_catalog;
pub mod postgres_order;
pub mod postgres_payment;
pub mod postgres_user;
pub mod scope;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::catalog::{
    MenuCategory, MenuCategoryFilter, MenuItem, MenuItemFilter, Restaurant, RestaurantFilter,
};
use crate::domain::ids::{MenuCategoryId, MenuItemId, OrderId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderFilter, OrderItem, OrderStatus};
use crate::domain::payment::PaymentMethod;
use crate::domain::repository::{
    MenuCategoryRepository, MenuItemRepository, OrderRepository, PaymentMethodRepository, RepositoryError,
    RestaurantRepository, StatusSwap, UserRepository,
};
use crate::domain::resource::{Predicate, RelationResolver, ResourceKind, Scoped};
use crate::domain::search::{contains_term, search_term};
use crate::domain::user::User;

/// Parse a text column into a domain enum, reporting bad values as corrupt rows.
pub(crate) fn decode<T>(raw: &str, column: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| RepositoryError::Corrupt(format!("{column}: {e}")))
}

pub(crate) fn money(minor: i64, column: &str) -> Result<Money, RepositoryError> {
    Money::from_minor(minor).map_err(|e| RepositoryError::Corrupt(format!("{column}: {e}")))
}

pub(crate) fn unsigned(value: i32, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|_| RepositoryError::Corrupt(format!("{column}: negative value {value}")))
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term taken literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    restaurants: HashMap<RestaurantId, Restaurant>,
    categories: HashMap<MenuCategoryId, MenuCategory>,
    items: HashMap<MenuItemId, MenuItem>,
    orders: HashMap<OrderId, Order>,
    payments: HashMap<PaymentMethodId, PaymentMethod>,
}

fn boxed<T: Scoped + Clone + 'static>(record: Option<&T>) -> Option<Box<dyn Scoped>> {
    record.cloned().map(|r| Box::new(r) as Box<dyn Scoped>)
}

impl RelationResolver for Tables {
    fn resolve(&self, target: ResourceKind, id: Uuid) -> Option<Box<dyn Scoped>> {
        match target {
            ResourceKind::User => boxed(self.users.get(&UserId(id))),
            ResourceKind::Restaurant => boxed(self.restaurants.get(&RestaurantId(id))),
            ResourceKind::MenuCategory => boxed(self.categories.get(&MenuCategoryId(id))),
            ResourceKind::MenuItem => boxed(self.items.get(&MenuItemId(id))),
            ResourceKind::Order => boxed(self.orders.get(&OrderId(id))),
            ResourceKind::PaymentMethod => boxed(self.payments.get(&PaymentMethodId(id))),
            ResourceKind::OrderItem => boxed(
                self.orders
                    .values()
                    .flat_map(|order| order.items())
                    .find(|item| item.id.as_uuid() == id),
            ),
        }
    }
}

impl Tables {
    fn scoped<'a, T: Scoped>(&self, record: Option<&'a T>, scope: &Predicate) -> Option<&'a T> {
        record.filter(|r| scope.matches(*r, self))
    }

    fn clear_defaults(&mut self, owner: UserId, except: PaymentMethodId) {
        for method in self.payments.values_mut() {
            if method.user_id == owner && method.id != except && method.is_default {
                method.is_default = false;
                method.updated_at = Utc::now();
            }
        }
    }

    fn item_is_referenced(&self, id: MenuItemId) -> bool {
        self.orders
            .values()
            .any(|order| order.items().iter().any(|line| line.menu_item_id == id))
    }

    /// Whether the ordering user's username or the restaurant's name contains `term`.
    fn order_mentions(&self, order: &Order, term: &str) -> bool {
        let username = self.users.get(&order.user_id).map(|u| u.username.as_str());
        let restaurant = self.restaurants.get(&order.restaurant_id).map(|r| r.name.as_str());
        username.into_iter().chain(restaurant).any(|field| contains_term(field, term))
    }
}

/// Shared in-memory backend for development, seeding and tests.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn save(&self, user: &User) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|existing| existing.username == user.username && existing.id != user.id);
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_in_scope(&self, id: UserId, scope: &Predicate) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.users.get(&id), scope).cloned())
    }

    async fn list(&self, scope: &Predicate) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| scope.matches(*u, &*tables))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("user {id}")));
        }
        tables.orders.retain(|_, order| order.user_id != id);
        tables.payments.retain(|_, method| method.user_id != id);
        for restaurant in tables.restaurants.values_mut() {
            if restaurant.owner_id == Some(id) {
                restaurant.owner_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RestaurantRepository for InMemoryStore {
    async fn save(&self, restaurant: &Restaurant) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.restaurants.insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: RestaurantId,
        scope: &Predicate,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.restaurants.get(&id), scope).cloned())
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut restaurants: Vec<Restaurant> = tables
            .restaurants
            .values()
            .filter(|r| filter.admits(r))
            .filter(|r| scope.matches(*r, &*tables))
            .cloned()
            .collect();
        restaurants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(restaurants)
    }

    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.restaurants.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("restaurant {id}")));
        }
        tables.orders.retain(|_, order| order.restaurant_id != id);
        let categories: Vec<MenuCategoryId> = tables
            .categories
            .values()
            .filter(|c| c.restaurant_id == id)
            .map(|c| c.id)
            .collect();
        tables.categories.retain(|_, c| c.restaurant_id != id);
        tables.items.retain(|_, item| !categories.contains(&item.category_id));
        Ok(())
    }
}

#[async_trait]
impl MenuCategoryRepository for InMemoryStore {
    async fn save(&self, category: &MenuCategory) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.restaurants.contains_key(&category.restaurant_id) {
            return Err(RepositoryError::Conflict(format!(
                "restaurant {} does not exist",
                category.restaurant_id
            )));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: MenuCategoryId,
        scope: &Predicate,
    ) -> Result<Option<MenuCategory>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.categories.get(&id), scope).cloned())
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuCategoryFilter,
    ) -> Result<Vec<MenuCategory>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<MenuCategory> = tables
            .categories
            .values()
            .filter(|c| filter.admits(c))
            .filter(|c| scope.matches(*c, &*tables))
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.display_order.cmp(&b.display_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn delete(&self, id: MenuCategoryId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&id) {
            return Err(RepositoryError::NotFound(format!("menu category {id}")));
        }
        let items: Vec<MenuItemId> = tables
            .items
            .values()
            .filter(|item| item.category_id == id)
            .map(|item| item.id)
            .collect();
        if items.iter().any(|item| tables.item_is_referenced(*item)) {
            return Err(RepositoryError::Conflict(format!(
                "menu category {id} has items referenced by orders"
            )));
        }
        tables.categories.remove(&id);
        tables.items.retain(|_, item| item.category_id != id);
        Ok(())
    }
}

#[async_trait]
impl MenuItemRepository for InMemoryStore {
    async fn save(&self, item: &MenuItem) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&item.category_id) {
            return Err(RepositoryError::Conflict(format!(
                "menu category {} does not exist",
                item.category_id
            )));
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn find_in_scope(&self, id: MenuItemId, scope: &Predicate) -> Result<Option<MenuItem>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.items.get(&id), scope).cloned())
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuItemFilter,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut items: Vec<MenuItem> = tables
            .items
            .values()
            .filter(|item| filter.admits(item))
            .filter(|item| scope.matches(*item, &*tables))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn delete(&self, id: MenuItemId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.item_is_referenced(id) {
            return Err(RepositoryError::Conflict(format!("menu item {id} is referenced by orders")));
        }
        tables
            .items
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("menu item {id}")))
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn create_with_items(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict(format!("order {} already exists", order.id)));
        }
        if let Some(missing) = order
            .items()
            .iter()
            .find(|line| !tables.items.contains_key(&line.menu_item_id))
        {
            return Err(RepositoryError::Conflict(format!(
                "menu item {} does not exist",
                missing.menu_item_id
            )));
        }
        tables.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .orders
            .get_mut(&order.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("order {}", order.id)))?;
        // Status, lines and total stay as stored.
        *stored = Order::restore(
            stored.id,
            stored.user_id,
            stored.restaurant_id,
            stored.status(),
            stored.country(),
            stored.total_amount(),
            order.delivery_address.clone(),
            order.payment_method_id,
            order.special_instructions.clone(),
            stored.items().to_vec(),
            stored.created_at,
            order.updated_at,
        );
        Ok(())
    }

    async fn swap_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, RepositoryError> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .orders
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("order {id}")))?;
        if stored.status() != expected {
            return Ok(StatusSwap::Stale {
                current: stored.status(),
            });
        }
        stored.restore_status(next, at);
        Ok(StatusSwap::Applied)
    }

    async fn find_in_scope(&self, id: OrderId, scope: &Predicate) -> Result<Option<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.orders.get(&id), scope).cloned())
    }

    async fn list(&self, scope: &Predicate, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut orders: Vec<Order> = tables
            .orders
            .values()
            .filter(|order| filter.admits(order))
            .filter(|order| {
                search_term(&filter.search).is_none_or(|term| tables.order_mentions(order, term))
            })
            .filter(|order| scope.matches(*order, &*tables))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn list_items(&self, scope: &Predicate) -> Result<Vec<OrderItem>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .flat_map(|order| order.items())
            .filter(|item| scope.matches(*item, &*tables))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        tables
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("order {id}")))
    }
}

#[async_trait]
impl PaymentMethodRepository for InMemoryStore {
    async fn create(&self, method: &PaymentMethod) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.payments.contains_key(&method.id) {
            return Err(RepositoryError::Conflict(format!("payment method {} already exists", method.id)));
        }
        if method.is_default {
            tables.clear_defaults(method.user_id, method.id);
        }
        tables.payments.insert(method.id, method.clone());
        Ok(())
    }

    async fn save(&self, method: &PaymentMethod) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.payments.contains_key(&method.id) {
            return Err(RepositoryError::NotFound(format!("payment method {}", method.id)));
        }
        if method.is_default {
            tables.clear_defaults(method.user_id, method.id);
        }
        tables.payments.insert(method.id, method.clone());
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: PaymentMethodId,
        scope: &Predicate,
    ) -> Result<Option<PaymentMethod>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.scoped(tables.payments.get(&id), scope).cloned())
    }

    async fn list(&self, scope: &Predicate) -> Result<Vec<PaymentMethod>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut methods: Vec<PaymentMethod> = tables
            .payments
            .values()
            .filter(|m| scope.matches(*m, &*tables))
            .cloned()
            .collect();
        methods.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(methods)
    }

    async fn set_default(&self, id: PaymentMethodId) -> Result<PaymentMethod, RepositoryError> {
        let mut tables = self.tables.write().await;
        let owner = tables
            .payments
            .get(&id)
            .map(|m| m.user_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("payment method {id}")))?;
        tables.clear_defaults(owner, id);
        let method = tables
            .payments
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("payment method {id}")))?;
        method.is_default = true;
        method.updated_at = Utc::now();
        Ok(method.clone())
    }

    async fn delete(&self, id: PaymentMethodId) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.payments.remove(&id).is_none() {
            return Err(RepositoryError::NotFound(format!("payment method {id}")));
        }
        for order in tables.orders.values_mut() {
            if order.payment_method_id == Some(id) {
                order.payment_method_id = None;
            }
        }
        Ok(())
    }
}

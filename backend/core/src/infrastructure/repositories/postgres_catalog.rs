// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Catalog Repository
//!
//! Restaurants, menu categories and menu items. One struct implements all
//! three repository traits since they share the pool and the join chain used
//! by indirect scopes (`menu_items → menu_categories → restaurants`).
//!
//! Deletes lean on the schema: restaurants cascade to categories, items and
//! orders; a menu item still referenced by an order line cannot be removed
//! and surfaces as [`RepositoryError::Conflict`].

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use super::scope::SqlScope;
use super::{decode, like_pattern, money, unsigned};
use crate::domain::catalog::{
    MenuCategory, MenuCategoryFilter, MenuItem, MenuItemFilter, Restaurant, RestaurantFilter,
};
use crate::domain::ids::{MenuCategoryId, MenuItemId, RestaurantId, UserId};
use crate::domain::repository::{MenuCategoryRepository, MenuItemRepository, RepositoryError, RestaurantRepository};
use crate::domain::resource::Predicate;
use crate::domain::search::search_term;

const RESTAURANT_COLUMNS: &str = "t.id, t.name, t.slug, t.description, t.address, t.country, \
     t.phone_number, t.email, t.is_active, t.owner_id, t.created_at, t.updated_at";

const CATEGORY_COLUMNS: &str = "t.id, t.restaurant_id, t.name, t.description, t.is_active, t.display_order";

const ITEM_COLUMNS: &str = "t.id, t.category_id, t.name, t.description, t.price_minor, t.is_vegetarian, \
     t.is_vegan, t.is_gluten_free, t.is_available, t.preparation_time_minutes, t.created_at, t.updated_at";

pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn restaurant_from_row(row: &PgRow) -> Result<Restaurant, RepositoryError> {
    let country: String = row.try_get("country")?;
    let owner: Option<uuid::Uuid> = row.try_get("owner_id")?;
    Ok(Restaurant::restore(
        RestaurantId(row.try_get("id")?),
        row.try_get("name")?,
        row.try_get("slug")?,
        row.try_get("description")?,
        row.try_get("address")?,
        decode(&country, "restaurants.country")?,
        row.try_get("phone_number")?,
        row.try_get("email")?,
        row.try_get("is_active")?,
        owner.map(UserId),
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

fn category_from_row(row: &PgRow) -> Result<MenuCategory, RepositoryError> {
    Ok(MenuCategory {
        id: MenuCategoryId(row.try_get("id")?),
        restaurant_id: RestaurantId(row.try_get("restaurant_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        display_order: unsigned(row.try_get("display_order")?, "menu_categories.display_order")?,
    })
}

fn item_from_row(row: &PgRow) -> Result<MenuItem, RepositoryError> {
    Ok(MenuItem {
        id: MenuItemId(row.try_get("id")?),
        category_id: MenuCategoryId(row.try_get("category_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: money(row.try_get("price_minor")?, "menu_items.price_minor")?,
        is_vegetarian: row.try_get("is_vegetarian")?,
        is_vegan: row.try_get("is_vegan")?,
        is_gluten_free: row.try_get("is_gluten_free")?,
        is_available: row.try_get("is_available")?,
        preparation_time_minutes: unsigned(
            row.try_get("preparation_time_minutes")?,
            "menu_items.preparation_time_minutes",
        )?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn not_found_unless_deleted(rows_affected: u64, what: String) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        return Err(RepositoryError::NotFound(what));
    }
    Ok(())
}

#[async_trait]
impl RestaurantRepository for PostgresCatalogRepository {
    async fn save(&self, restaurant: &Restaurant) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO restaurants (
                id, name, slug, description, address, country,
                phone_number, email, is_active, owner_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug,
                description = EXCLUDED.description,
                address = EXCLUDED.address,
                phone_number = EXCLUDED.phone_number,
                email = EXCLUDED.email,
                is_active = EXCLUDED.is_active,
                owner_id = EXCLUDED.owner_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(restaurant.id.0)
        .bind(&restaurant.name)
        .bind(&restaurant.slug)
        .bind(&restaurant.description)
        .bind(&restaurant.address)
        .bind(restaurant.country().as_str())
        .bind(&restaurant.phone_number)
        .bind(&restaurant.email)
        .bind(restaurant.is_active)
        .bind(restaurant.owner_id.map(|id| id.0))
        .bind(restaurant.created_at)
        .bind(restaurant.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: RestaurantId,
        scope: &Predicate,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants t WHERE t.id = $1 AND {}",
            scope.clause
        );
        let row = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(restaurant_from_row).transpose()
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 4);
        let sql = format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants t \
             WHERE ($1::text IS NULL OR t.country = $1) \
             AND ($2::bool IS NULL OR t.is_active = $2) \
             AND ($3::text IS NULL OR t.name ILIKE $3 OR t.description ILIKE $3 OR t.address ILIKE $3) \
             AND {} \
             ORDER BY t.name",
            scope.clause
        );
        let query = sqlx::query(&sql)
            .bind(filter.country.map(|c| c.as_str()))
            .bind(filter.is_active)
            .bind(search_term(&filter.search).map(like_pattern));
        let rows = scope.bind(query).fetch_all(&self.pool).await?;
        rows.iter().map(restaurant_from_row).collect()
    }

    async fn delete(&self, id: RestaurantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        not_found_unless_deleted(result.rows_affected(), format!("restaurant {id}"))
    }
}

#[async_trait]
impl MenuCategoryRepository for PostgresCatalogRepository {
    async fn save(&self, category: &MenuCategory) -> Result<(), RepositoryError> {
        let display_order = i32::try_from(category.display_order)
            .map_err(|_| RepositoryError::Conflict("display_order out of range".to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO menu_categories (id, restaurant_id, name, description, is_active, display_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                is_active = EXCLUDED.is_active,
                display_order = EXCLUDED.display_order
            "#,
        )
        .bind(category.id.0)
        .bind(category.restaurant_id.0)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .bind(display_order)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_in_scope(
        &self,
        id: MenuCategoryId,
        scope: &Predicate,
    ) -> Result<Option<MenuCategory>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM menu_categories t WHERE t.id = $1 AND {}",
            scope.clause
        );
        let row = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuCategoryFilter,
    ) -> Result<Vec<MenuCategory>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 3);
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM menu_categories t \
             WHERE ($1::uuid IS NULL OR t.restaurant_id = $1) \
             AND ($2::bool IS NULL OR t.is_active = $2) \
             AND {} \
             ORDER BY t.display_order, t.name",
            scope.clause
        );
        let query = sqlx::query(&sql)
            .bind(filter.restaurant_id.map(|id| id.0))
            .bind(filter.is_active);
        let rows = scope.bind(query).fetch_all(&self.pool).await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn delete(&self, id: MenuCategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_categories WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        not_found_unless_deleted(result.rows_affected(), format!("menu category {id}"))
    }
}

#[async_trait]
impl MenuItemRepository for PostgresCatalogRepository {
    async fn save(&self, item: &MenuItem) -> Result<(), RepositoryError> {
        let preparation = i32::try_from(item.preparation_time_minutes)
            .map_err(|_| RepositoryError::Conflict("preparation_time_minutes out of range".to_string()))?;
        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, category_id, name, description, price_minor, is_vegetarian, is_vegan,
                is_gluten_free, is_available, preparation_time_minutes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                category_id = EXCLUDED.category_id,
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price_minor = EXCLUDED.price_minor,
                is_vegetarian = EXCLUDED.is_vegetarian,
                is_vegan = EXCLUDED.is_vegan,
                is_gluten_free = EXCLUDED.is_gluten_free,
                is_available = EXCLUDED.is_available,
                preparation_time_minutes = EXCLUDED.preparation_time_minutes,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(item.id.0)
        .bind(item.category_id.0)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.price.minor())
        .bind(item.is_vegetarian)
        .bind(item.is_vegan)
        .bind(item.is_gluten_free)
        .bind(item.is_available)
        .bind(preparation)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_in_scope(&self, id: MenuItemId, scope: &Predicate) -> Result<Option<MenuItem>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 2);
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items t WHERE t.id = $1 AND {}",
            scope.clause
        );
        let row = scope
            .bind(sqlx::query(&sql).bind(id.0))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn list(
        &self,
        scope: &Predicate,
        filter: &MenuItemFilter,
    ) -> Result<Vec<MenuItem>, RepositoryError> {
        let scope = SqlScope::render(scope, "t", 7);
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items t \
             WHERE ($1::uuid IS NULL OR t.category_id = $1) \
             AND ($2::bool IS NULL OR t.is_available = $2) \
             AND ($3::bool IS NULL OR t.is_vegetarian = $3) \
             AND ($4::bool IS NULL OR t.is_vegan = $4) \
             AND ($5::bool IS NULL OR t.is_gluten_free = $5) \
             AND ($6::text IS NULL OR t.name ILIKE $6 OR t.description ILIKE $6) \
             AND {} \
             ORDER BY t.name",
            scope.clause
        );
        let query = sqlx::query(&sql)
            .bind(filter.category_id.map(|id| id.0))
            .bind(filter.is_available)
            .bind(filter.is_vegetarian)
            .bind(filter.is_vegan)
            .bind(filter.is_gluten_free)
            .bind(search_term(&filter.search).map(like_pattern));
        let rows = scope.bind(query).fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn delete(&self, id: MenuItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        not_found_unless_deleted(result.rows_affected(), format!("menu item {id}"))
    }
}

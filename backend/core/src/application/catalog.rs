// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Catalog Service
//!
//! Restaurants, menu categories and menu items. Reads are narrowed to the
//! actor's country; writes are admin-only.
//!
//! Categories and items carry no country of their own. Their record-level
//! checks run against the parent chain, loaded ahead of the check into a
//! [`CatalogRelations`] resolver.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::policy::PolicyService;
use crate::domain::actor::{Actor, Country};
use crate::domain::catalog::{
    slugify, CatalogRelations, MenuCategory, MenuCategoryFilter, MenuItem, MenuItemFilter, MenuSection, Restaurant,
    RestaurantFilter,
};
use crate::domain::ids::{MenuCategoryId, MenuItemId, RestaurantId, UserId};
use crate::domain::money::Money;
use crate::domain::policy::{Action, RecordRef};
use crate::domain::repository::{MenuCategoryRepository, MenuItemRepository, RestaurantRepository};
use crate::domain::resource::{NoRelations, Predicate, ResourceKind};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRestaurant {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub address: String,
    pub country: Country,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub owner_id: Option<UserId>,
}

/// Partial update. The country is fixed at creation and cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantUpdate {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
    pub owner_id: Option<UserId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuCategory {
    pub restaurant_id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_order: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMenuItem {
    pub category_id: MenuCategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default)]
    pub is_gluten_free: bool,
    #[serde(default)]
    pub preparation_time_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    pub is_available: Option<bool>,
    pub preparation_time_minutes: Option<u32>,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Restaurants the actor may see, narrowed by `filter`.
    async fn list_restaurants(&self, actor: &Actor, filter: RestaurantFilter) -> Result<Vec<Restaurant>, ServiceError>;
    async fn get_restaurant(&self, actor: &Actor, id: RestaurantId) -> Result<Restaurant, ServiceError>;
    async fn create_restaurant(&self, actor: &Actor, input: NewRestaurant) -> Result<Restaurant, ServiceError>;
    async fn update_restaurant(
        &self,
        actor: &Actor,
        id: RestaurantId,
        update: RestaurantUpdate,
    ) -> Result<Restaurant, ServiceError>;
    async fn delete_restaurant(&self, actor: &Actor, id: RestaurantId) -> Result<(), ServiceError>;
    /// Active categories of the restaurant, each with its available items.
    async fn restaurant_menu(&self, actor: &Actor, id: RestaurantId) -> Result<Vec<MenuSection>, ServiceError>;

    async fn list_categories(
        &self,
        actor: &Actor,
        filter: MenuCategoryFilter,
    ) -> Result<Vec<MenuCategory>, ServiceError>;
    async fn get_category(&self, actor: &Actor, id: MenuCategoryId) -> Result<MenuCategory, ServiceError>;
    async fn create_category(&self, actor: &Actor, input: NewMenuCategory) -> Result<MenuCategory, ServiceError>;
    async fn update_category(
        &self,
        actor: &Actor,
        id: MenuCategoryId,
        update: MenuCategoryUpdate,
    ) -> Result<MenuCategory, ServiceError>;
    async fn delete_category(&self, actor: &Actor, id: MenuCategoryId) -> Result<(), ServiceError>;

    async fn list_menu_items(
        &self,
        actor: &Actor,
        filter: MenuItemFilter,
    ) -> Result<Vec<MenuItem>, ServiceError>;
    async fn get_menu_item(&self, actor: &Actor, id: MenuItemId) -> Result<MenuItem, ServiceError>;
    async fn create_menu_item(&self, actor: &Actor, input: NewMenuItem) -> Result<MenuItem, ServiceError>;
    async fn update_menu_item(
        &self,
        actor: &Actor,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, ServiceError>;
    async fn delete_menu_item(&self, actor: &Actor, id: MenuItemId) -> Result<(), ServiceError>;
}

pub struct StandardCatalogService {
    restaurants: Arc<dyn RestaurantRepository>,
    categories: Arc<dyn MenuCategoryRepository>,
    items: Arc<dyn MenuItemRepository>,
    policy: PolicyService,
}

impl StandardCatalogService {
    pub fn new(
        restaurants: Arc<dyn RestaurantRepository>,
        categories: Arc<dyn MenuCategoryRepository>,
        items: Arc<dyn MenuItemRepository>,
        policy: PolicyService,
    ) -> Self {
        Self {
            restaurants,
            categories,
            items,
            policy,
        }
    }

    async fn load_restaurant(
        &self,
        actor: &Actor,
        action: Action,
        id: RestaurantId,
    ) -> Result<Restaurant, ServiceError> {
        let kind = ResourceKind::Restaurant;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let restaurant = self
            .restaurants
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&restaurant, &NoRelations)))?;
        Ok(restaurant)
    }

    async fn load_category(
        &self,
        actor: &Actor,
        action: Action,
        id: MenuCategoryId,
    ) -> Result<MenuCategory, ServiceError> {
        let kind = ResourceKind::MenuCategory;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let category = self
            .categories
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        let relations = self.category_relations(&category, &scope).await?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&category, &relations)))?;
        Ok(category)
    }

    async fn load_item(&self, actor: &Actor, action: Action, id: MenuItemId) -> Result<MenuItem, ServiceError> {
        let kind = ResourceKind::MenuItem;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let item = self
            .items
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        let relations = self.item_relations(&item, &scope).await?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&item, &relations)))?;
        Ok(item)
    }

    /// Parents of `category`. Skipped when `scope` does not need them.
    async fn category_relations(
        &self,
        category: &MenuCategory,
        scope: &Predicate,
    ) -> Result<CatalogRelations, ServiceError> {
        let mut relations = CatalogRelations::new();
        if scope.is_unrestricted() {
            return Ok(relations);
        }
        if let Some(restaurant) = self
            .restaurants
            .find_in_scope(category.restaurant_id, &Predicate::All)
            .await?
        {
            relations = relations.with_restaurant(restaurant);
        }
        Ok(relations)
    }

    async fn item_relations(&self, item: &MenuItem, scope: &Predicate) -> Result<CatalogRelations, ServiceError> {
        if scope.is_unrestricted() {
            return Ok(CatalogRelations::new());
        }
        let Some(category) = self.categories.find_in_scope(item.category_id, &Predicate::All).await? else {
            return Ok(CatalogRelations::new());
        };
        let relations = self.category_relations(&category, scope).await?;
        Ok(relations.with_category(category))
    }
}

fn require_name(name: &str, what: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid(format!("{what} name is required")));
    }
    Ok(name.to_string())
}

#[async_trait]
impl CatalogService for StandardCatalogService {
    async fn list_restaurants(&self, actor: &Actor, filter: RestaurantFilter) -> Result<Vec<Restaurant>, ServiceError> {
        let kind = ResourceKind::Restaurant;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.restaurants.list(&scope, &filter).await?)
    }

    async fn get_restaurant(&self, actor: &Actor, id: RestaurantId) -> Result<Restaurant, ServiceError> {
        self.load_restaurant(actor, Action::Retrieve, id).await
    }

    async fn create_restaurant(&self, actor: &Actor, input: NewRestaurant) -> Result<Restaurant, ServiceError> {
        self.policy.require(actor, Action::Create, ResourceKind::Restaurant, None)?;

        let name = require_name(&input.name, "Restaurant")?;
        let mut restaurant = Restaurant::new(name, input.address, input.country);
        if let Some(slug) = input.slug.as_deref().map(slugify).filter(|s| !s.is_empty()) {
            restaurant.slug = slug;
        }
        restaurant.description = input.description;
        restaurant.phone_number = input.phone_number;
        restaurant.email = input.email;
        restaurant.owner_id = input.owner_id;

        self.restaurants.save(&restaurant).await?;
        info!("Restaurant {} ({}) created by {}", restaurant.name, restaurant.id, actor.username());
        Ok(restaurant)
    }

    async fn update_restaurant(
        &self,
        actor: &Actor,
        id: RestaurantId,
        update: RestaurantUpdate,
    ) -> Result<Restaurant, ServiceError> {
        let mut restaurant = self.load_restaurant(actor, Action::Update, id).await?;

        if let Some(name) = update.name {
            restaurant.name = require_name(&name, "Restaurant")?;
        }
        if let Some(slug) = update.slug {
            restaurant.slug = slugify(&slug);
        }
        if restaurant.slug.is_empty() {
            restaurant.slug = slugify(&restaurant.name);
        }
        if let Some(description) = update.description {
            restaurant.description = description;
        }
        if let Some(address) = update.address {
            restaurant.address = address;
        }
        if let Some(phone_number) = update.phone_number {
            restaurant.phone_number = phone_number;
        }
        if let Some(email) = update.email {
            restaurant.email = email;
        }
        if let Some(is_active) = update.is_active {
            restaurant.is_active = is_active;
        }
        if let Some(owner_id) = update.owner_id {
            restaurant.owner_id = Some(owner_id);
        }
        restaurant.touch();

        self.restaurants.save(&restaurant).await?;
        Ok(restaurant)
    }

    async fn delete_restaurant(&self, actor: &Actor, id: RestaurantId) -> Result<(), ServiceError> {
        let restaurant = self.load_restaurant(actor, Action::Delete, id).await?;
        self.restaurants.delete(restaurant.id).await?;
        info!("Restaurant {} deleted by {}", restaurant.id, actor.username());
        Ok(())
    }

    async fn restaurant_menu(&self, actor: &Actor, id: RestaurantId) -> Result<Vec<MenuSection>, ServiceError> {
        let restaurant = self.load_restaurant(actor, Action::Retrieve, id).await?;

        self.policy.require(actor, Action::List, ResourceKind::MenuCategory, None)?;
        self.policy.require(actor, Action::List, ResourceKind::MenuItem, None)?;
        let category_scope = self.policy.scope(actor, ResourceKind::MenuCategory);
        let item_scope = self.policy.scope(actor, ResourceKind::MenuItem);

        let active = MenuCategoryFilter {
            restaurant_id: Some(restaurant.id),
            is_active: Some(true),
        };
        let categories = self.categories.list(&category_scope, &active).await?;
        let mut sections = Vec::new();
        for category in categories {
            let available = MenuItemFilter {
                category_id: Some(category.id),
                is_available: Some(true),
                ..Default::default()
            };
            let items = self.items.list(&item_scope, &available).await?;
            sections.push(MenuSection { category, items });
        }
        Ok(sections)
    }

    async fn list_categories(
        &self,
        actor: &Actor,
        filter: MenuCategoryFilter,
    ) -> Result<Vec<MenuCategory>, ServiceError> {
        let kind = ResourceKind::MenuCategory;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.categories.list(&scope, &filter).await?)
    }

    async fn get_category(&self, actor: &Actor, id: MenuCategoryId) -> Result<MenuCategory, ServiceError> {
        self.load_category(actor, Action::Retrieve, id).await
    }

    async fn create_category(&self, actor: &Actor, input: NewMenuCategory) -> Result<MenuCategory, ServiceError> {
        let kind = ResourceKind::MenuCategory;
        self.policy.require(actor, Action::Create, kind, None)?;

        let restaurant_scope = self.policy.scope(actor, ResourceKind::Restaurant);
        let restaurant = self
            .restaurants
            .find_in_scope(input.restaurant_id, &restaurant_scope)
            .await?
            .ok_or_else(|| ServiceError::invalid(format!("Restaurant {} does not exist", input.restaurant_id)))?;

        let mut category = MenuCategory::new(restaurant.id, require_name(&input.name, "Category")?, input.display_order);
        category.description = input.description;

        self.categories.save(&category).await?;
        Ok(category)
    }

    async fn update_category(
        &self,
        actor: &Actor,
        id: MenuCategoryId,
        update: MenuCategoryUpdate,
    ) -> Result<MenuCategory, ServiceError> {
        let mut category = self.load_category(actor, Action::Update, id).await?;

        if let Some(name) = update.name {
            category.name = require_name(&name, "Category")?;
        }
        if let Some(description) = update.description {
            category.description = description;
        }
        if let Some(is_active) = update.is_active {
            category.is_active = is_active;
        }
        if let Some(display_order) = update.display_order {
            category.display_order = display_order;
        }

        self.categories.save(&category).await?;
        Ok(category)
    }

    async fn delete_category(&self, actor: &Actor, id: MenuCategoryId) -> Result<(), ServiceError> {
        let category = self.load_category(actor, Action::Delete, id).await?;
        self.categories.delete(category.id).await?;
        Ok(())
    }

    async fn list_menu_items(
        &self,
        actor: &Actor,
        filter: MenuItemFilter,
    ) -> Result<Vec<MenuItem>, ServiceError> {
        let kind = ResourceKind::MenuItem;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.items.list(&scope, &filter).await?)
    }

    async fn get_menu_item(&self, actor: &Actor, id: MenuItemId) -> Result<MenuItem, ServiceError> {
        self.load_item(actor, Action::Retrieve, id).await
    }

    async fn create_menu_item(&self, actor: &Actor, input: NewMenuItem) -> Result<MenuItem, ServiceError> {
        let kind = ResourceKind::MenuItem;
        self.policy.require(actor, Action::Create, kind, None)?;

        let category_scope = self.policy.scope(actor, ResourceKind::MenuCategory);
        let category = self
            .categories
            .find_in_scope(input.category_id, &category_scope)
            .await?
            .ok_or_else(|| ServiceError::invalid(format!("Menu category {} does not exist", input.category_id)))?;

        let mut item = MenuItem::new(category.id, require_name(&input.name, "Menu item")?, input.price);
        item.description = input.description;
        item.is_vegetarian = input.is_vegetarian;
        item.is_vegan = input.is_vegan;
        item.is_gluten_free = input.is_gluten_free;
        if let Some(minutes) = input.preparation_time_minutes {
            item.preparation_time_minutes = minutes;
        }

        self.items.save(&item).await?;
        Ok(item)
    }

    async fn update_menu_item(
        &self,
        actor: &Actor,
        id: MenuItemId,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, ServiceError> {
        let mut item = self.load_item(actor, Action::Update, id).await?;

        if let Some(name) = update.name {
            item.name = require_name(&name, "Menu item")?;
        }
        if let Some(description) = update.description {
            item.description = description;
        }
        // Existing orders keep their snapshot price.
        if let Some(price) = update.price {
            item.price = price;
        }
        if let Some(v) = update.is_vegetarian {
            item.is_vegetarian = v;
        }
        if let Some(v) = update.is_vegan {
            item.is_vegan = v;
        }
        if let Some(v) = update.is_gluten_free {
            item.is_gluten_free = v;
        }
        if let Some(v) = update.is_available {
            item.is_available = v;
        }
        if let Some(minutes) = update.preparation_time_minutes {
            item.preparation_time_minutes = minutes;
        }
        item.updated_at = chrono::Utc::now();

        self.items.save(&item).await?;
        Ok(item)
    }

    async fn delete_menu_item(&self, actor: &Actor, id: MenuItemId) -> Result<(), ServiceError> {
        let item = self.load_item(actor, Action::Delete, id).await?;
        self.items.delete(item.id).await?;
        Ok(())
    }
}

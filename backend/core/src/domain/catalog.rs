// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Restaurants and their menus.
//!
//! Catalog data is shared read data. Only `Restaurant` carries a country;
//! categories and items reach it through their parent relations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::actor::Country;
use crate::domain::ids::{MenuCategoryId, MenuItemId, RestaurantId, UserId};
use crate::domain::money::Money;
use crate::domain::resource::{AttrValue, RelationResolver, ResourceKind, Scoped};
use crate::domain::search::{any_field_contains, search_term};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub address: String,
    /// Fixed at creation.
    country: Country,
    pub phone_number: String,
    pub email: String,
    pub is_active: bool,
    pub owner_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Restaurant {
    pub fn new(name: impl Into<String>, address: impl Into<String>, country: Country) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: RestaurantId::new(),
            slug: slugify(&name),
            name,
            description: String::new(),
            address: address.into(),
            country,
            phone_number: String::new(),
            email: String::new(),
            is_active: true,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a restaurant from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: RestaurantId,
        name: String,
        slug: String,
        description: String,
        address: String,
        country: Country,
        phone_number: String,
        email: String,
        is_active: bool,
        owner_id: Option<UserId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            slug,
            description,
            address,
            country,
            phone_number,
            email,
            is_active,
            owner_id,
            created_at,
            updated_at,
        }
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Scoped for Restaurant {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "country" => Some(AttrValue::Country(self.country)),
            "owner_id" => self.owner_id.map(|owner| AttrValue::Id(owner.as_uuid())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuCategory {
    pub id: MenuCategoryId,
    pub restaurant_id: RestaurantId,
    pub name: String,
    pub description: String,
    pub is_active: bool,
    pub display_order: u32,
}

impl MenuCategory {
    pub fn new(restaurant_id: RestaurantId, name: impl Into<String>, display_order: u32) -> Self {
        Self {
            id: MenuCategoryId::new(),
            restaurant_id,
            name: name.into(),
            description: String::new(),
            is_active: true,
            display_order,
        }
    }
}

impl Scoped for MenuCategory {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "restaurant_id" => Some(AttrValue::Id(self.restaurant_id.as_uuid())),
            _ => None,
        }
    }
}

pub const DEFAULT_PREPARATION_MINUTES: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub category_id: MenuCategoryId,
    pub name: String,
    pub description: String,
    /// Live catalog price. Orders snapshot it at creation.
    pub price: Money,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_available: bool,
    pub preparation_time_minutes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn new(category_id: MenuCategoryId, name: impl Into<String>, price: Money) -> Self {
        let now = Utc::now();
        Self {
            id: MenuItemId::new(),
            category_id,
            name: name.into(),
            description: String::new(),
            price,
            is_vegetarian: false,
            is_vegan: false,
            is_gluten_free: false,
            is_available: true,
            preparation_time_minutes: DEFAULT_PREPARATION_MINUTES,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Scoped for MenuItem {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "category_id" => Some(AttrValue::Id(self.category_id.as_uuid())),
            _ => None,
        }
    }
}

/// Optional narrowing of restaurant lists, applied on top of the scope
/// predicate. A filter can only remove rows from what the scope admits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RestaurantFilter {
    pub country: Option<Country>,
    pub is_active: Option<bool>,
    /// Matched against name, description and address.
    pub search: Option<String>,
}

impl RestaurantFilter {
    pub fn admits(&self, restaurant: &Restaurant) -> bool {
        self.country.is_none_or(|country| restaurant.country() == country)
            && self.is_active.is_none_or(|active| restaurant.is_active == active)
            && search_term(&self.search).is_none_or(|term| {
                any_field_contains(
                    &[
                        restaurant.name.as_str(),
                        restaurant.description.as_str(),
                        restaurant.address.as_str(),
                    ],
                    term,
                )
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuCategoryFilter {
    pub restaurant_id: Option<RestaurantId>,
    pub is_active: Option<bool>,
}

impl MenuCategoryFilter {
    pub fn admits(&self, category: &MenuCategory) -> bool {
        self.restaurant_id.is_none_or(|id| category.restaurant_id == id)
            && self.is_active.is_none_or(|active| category.is_active == active)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MenuItemFilter {
    pub category_id: Option<MenuCategoryId>,
    pub is_available: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub is_gluten_free: Option<bool>,
    /// Matched against name and description.
    pub search: Option<String>,
}

impl MenuItemFilter {
    pub fn admits(&self, item: &MenuItem) -> bool {
        self.category_id.is_none_or(|id| item.category_id == id)
            && self.is_available.is_none_or(|flag| item.is_available == flag)
            && self.is_vegetarian.is_none_or(|flag| item.is_vegetarian == flag)
            && self.is_vegan.is_none_or(|flag| item.is_vegan == flag)
            && self.is_gluten_free.is_none_or(|flag| item.is_gluten_free == flag)
            && search_term(&self.search).is_none_or(|term| {
                any_field_contains(&[item.name.as_str(), item.description.as_str()], term)
            })
    }
}

/// A category together with its currently available items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuSection {
    pub category: MenuCategory,
    pub items: Vec<MenuItem>,
}

/// Parent records loaded ahead of a record-level policy check, so indirect
/// scopes of categories and items can be evaluated without storage access.
#[derive(Debug, Clone, Default)]
pub struct CatalogRelations {
    restaurants: HashMap<RestaurantId, Restaurant>,
    categories: HashMap<MenuCategoryId, MenuCategory>,
}

impl CatalogRelations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_restaurant(mut self, restaurant: Restaurant) -> Self {
        self.restaurants.insert(restaurant.id, restaurant);
        self
    }

    pub fn with_category(mut self, category: MenuCategory) -> Self {
        self.categories.insert(category.id, category);
        self
    }
}

impl RelationResolver for CatalogRelations {
    fn resolve(&self, target: ResourceKind, id: Uuid) -> Option<Box<dyn Scoped>> {
        match target {
            ResourceKind::Restaurant => self
                .restaurants
                .get(&RestaurantId(id))
                .cloned()
                .map(|r| Box::new(r) as Box<dyn Scoped>),
            ResourceKind::MenuCategory => self
                .categories
                .get(&MenuCategoryId(id))
                .cloned()
                .map(|c| Box::new(c) as Box<dyn Scoped>),
            _ => None,
        }
    }
}

/// Lowercase, ASCII alphanumerics joined by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Taj Mahal Restaurant"), "taj-mahal-restaurant");
        assert_eq!(slugify("  Burger -- Palace! "), "burger-palace");
        assert_eq!(slugify("Café 21"), "caf-21");
    }

    #[test]
    fn test_new_restaurant_derives_slug() {
        let restaurant = Restaurant::new("Pizza Heaven", "321 Broadway", Country::America);
        assert_eq!(restaurant.slug, "pizza-heaven");
        assert_eq!(restaurant.country(), Country::America);
        assert_eq!(
            restaurant.attribute("country"),
            Some(AttrValue::Country(Country::America))
        );
    }

    #[test]
    fn test_menu_item_exposes_parent_key() {
        let category = MenuCategory::new(RestaurantId::new(), "Main Course", 2);
        let item = MenuItem::new(category.id, "Samosa", Money::from_minor(599).unwrap());
        assert_eq!(item.attribute("category_id"), Some(AttrValue::Id(category.id.as_uuid())));
        assert_eq!(item.attribute("country"), None);
        assert_eq!(item.preparation_time_minutes, DEFAULT_PREPARATION_MINUTES);
    }

    #[test]
    fn test_filters_narrow_by_flags_and_search() {
        let mut restaurant = Restaurant::new("Spice Garden", "456 Park Street, Delhi", Country::India);
        restaurant.description = "South Indian vegetarian".to_string();
        let by_search = RestaurantFilter {
            search: Some("park street".to_string()),
            ..Default::default()
        };
        assert!(by_search.admits(&restaurant));
        let wrong_country = RestaurantFilter {
            country: Some(Country::America),
            ..Default::default()
        };
        assert!(!wrong_country.admits(&restaurant));
        restaurant.is_active = false;
        let active_only = RestaurantFilter {
            is_active: Some(true),
            ..Default::default()
        };
        assert!(!active_only.admits(&restaurant));

        let mut item = MenuItem::new(MenuCategoryId::new(), "Masala Dosa", Money::from_minor(799).unwrap());
        item.is_vegetarian = true;
        let vegetarian = MenuItemFilter {
            is_vegetarian: Some(true),
            search: Some("dosa".to_string()),
            ..Default::default()
        };
        assert!(vegetarian.admits(&item));
        let vegan = MenuItemFilter {
            is_vegan: Some(true),
            ..Default::default()
        };
        assert!(!vegan.admits(&item));

        let mut category = MenuCategory::new(restaurant.id, "Breakfast", 1);
        category.is_active = false;
        let active_categories = MenuCategoryFilter {
            restaurant_id: Some(restaurant.id),
            is_active: Some(true),
        };
        assert!(!active_categories.admits(&category));
    }

    #[test]
    fn test_prefetched_relations_resolve_item_country() {
        use crate::domain::resource::Predicate;

        let restaurant = Restaurant::new("Spice Garden", "Park Street", Country::India);
        let category = MenuCategory::new(restaurant.id, "Starters", 1);
        let item = MenuItem::new(category.id, "Samosa", Money::from_minor(599).unwrap());
        let relations = CatalogRelations::new()
            .with_restaurant(restaurant.clone())
            .with_category(category.clone());

        let descriptor = ResourceKind::MenuItem.descriptor();
        let india = crate::domain::actor::Actor::new(
            UserId::new(),
            "thanos",
            crate::domain::actor::Role::Member,
            Some(Country::India),
        );
        let predicate: Predicate = descriptor.scope_filter(&india);
        assert!(predicate.matches(&item, &relations));
        assert!(!predicate.matches(&item, &CatalogRelations::new().with_category(category)));
    }
}

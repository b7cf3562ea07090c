// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Demo data set: six users across both countries, four restaurants with
//! menus, one default payment method per staff user and two sample orders.
//!
//! Seeding writes straight to the repositories. It is an operator action and
//! does not run through the policy engine.

use tracing::info;

use crate::application::repository_factory::Repositories;
use crate::domain::actor::{Country, Role};
use crate::domain::catalog::{MenuCategory, MenuItem, Restaurant};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderError, OrderLine, OrderStatus};
use crate::domain::payment::{PaymentMethod, PaymentType};
use crate::domain::repository::RepositoryError;
use crate::domain::user::User;

pub const DEMO_USERS: [(&str, Role, Country); 6] = [
    ("nick_fury", Role::Admin, Country::America),
    ("captain_marvel", Role::Manager, Country::India),
    ("captain_america", Role::Manager, Country::America),
    ("thanos", Role::Member, Country::India),
    ("thor", Role::Member, Country::India),
    ("travis", Role::Member, Country::America),
];

#[derive(Debug, Clone, Default)]
pub struct DemoData {
    pub users: Vec<User>,
    pub restaurants: Vec<Restaurant>,
    pub categories: Vec<MenuCategory>,
    pub items: Vec<MenuItem>,
    pub payment_methods: Vec<PaymentMethod>,
    pub orders: Vec<Order>,
}

impl DemoData {
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn restaurant(&self, name: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.name == name)
    }

    pub fn item(&self, name: &str) -> Option<&MenuItem> {
        self.items.iter().find(|i| i.name == name)
    }
}

struct ItemSeed {
    name: &'static str,
    description: &'static str,
    price_minor: i64,
    vegetarian: bool,
    vegan: bool,
    preparation_minutes: u32,
}

const fn item(
    name: &'static str,
    description: &'static str,
    price_minor: i64,
    vegetarian: bool,
    preparation_minutes: u32,
) -> ItemSeed {
    ItemSeed {
        name,
        description,
        price_minor,
        vegetarian,
        vegan: false,
        preparation_minutes,
    }
}

struct RestaurantSeed {
    name: &'static str,
    description: &'static str,
    address: &'static str,
    country: Country,
    phone: &'static str,
    email: &'static str,
    owner: &'static str,
    menu: &'static [(&'static str, u32, &'static [ItemSeed])],
}

const RESTAURANTS: [RestaurantSeed; 4] = [
    RestaurantSeed {
        name: "Taj Mahal Restaurant",
        description: "Authentic Indian cuisine with royal taste",
        address: "123 MG Road, Mumbai, India",
        country: Country::India,
        phone: "+91-22-12345678",
        email: "info@tajmahal.in",
        owner: "captain_marvel",
        menu: &[
            (
                "Appetizers",
                1,
                &[item("Samosa", "Crispy pastry filled with spiced potatoes", 599, true, 15)],
            ),
            (
                "Main Course",
                2,
                &[
                    item("Chicken Tikka Masala", "Tender chicken in creamy tomato sauce", 1599, false, 30),
                    item("Paneer Butter Masala", "Cottage cheese in rich butter gravy", 1299, true, 25),
                ],
            ),
        ],
    },
    RestaurantSeed {
        name: "Spice Garden",
        description: "South Indian delicacies",
        address: "456 Brigade Road, Bangalore, India",
        country: Country::India,
        phone: "+91-80-87654321",
        email: "contact@spicegarden.in",
        owner: "captain_marvel",
        menu: &[(
            "Breakfast",
            1,
            &[
                item("Masala Dosa", "Crispy rice crepe with potato filling", 899, true, 20),
                ItemSeed {
                    name: "Idli Sambar",
                    description: "Steamed rice cakes with lentil soup",
                    price_minor: 699,
                    vegetarian: true,
                    vegan: true,
                    preparation_minutes: 15,
                },
            ],
        )],
    },
    RestaurantSeed {
        name: "Burger Palace",
        description: "Classic American burgers and fries",
        address: "789 5th Avenue, New York, USA",
        country: Country::America,
        phone: "+1-212-5551234",
        email: "info@burgerpalace.com",
        owner: "captain_america",
        menu: &[
            (
                "Burgers",
                1,
                &[
                    item("Classic Cheeseburger", "Beef patty with cheese, lettuce, tomato", 1299, false, 15),
                    item("Veggie Burger", "Plant-based patty with fresh vegetables", 1199, true, 15),
                ],
            ),
            ("Sides", 2, &[item("French Fries", "Crispy golden fries", 499, true, 10)]),
        ],
    },
    RestaurantSeed {
        name: "Pizza Heaven",
        description: "New York style pizzas",
        address: "321 Broadway, New York, USA",
        country: Country::America,
        phone: "+1-212-5555678",
        email: "hello@pizzaheaven.com",
        owner: "captain_america",
        menu: &[(
            "Pizzas",
            1,
            &[
                item("Margherita Pizza", "Classic tomato sauce, mozzarella, basil", 1499, true, 20),
                item("Pepperoni Pizza", "Tomato sauce, mozzarella, pepperoni", 1699, false, 20),
            ],
        )],
    },
];

fn missing(what: &str) -> RepositoryError {
    RepositoryError::NotFound(format!("demo {what}"))
}

fn seed_order(err: OrderError) -> RepositoryError {
    RepositoryError::Conflict(format!("demo order: {err}"))
}

/// Populate empty storage with the demo data set.
pub async fn seed_demo_data(repos: &Repositories) -> Result<DemoData, RepositoryError> {
    if repos.users.find_by_username(DEMO_USERS[0].0).await?.is_some() {
        return Err(RepositoryError::Conflict("demo data is already present".to_string()));
    }

    let mut data = DemoData::default();

    for (username, role, country) in DEMO_USERS {
        let user = User::new(username, format!("{username}@example.com"), role, Some(country));
        repos.users.save(&user).await?;
        data.users.push(user);
    }

    for seed in &RESTAURANTS {
        let mut restaurant = Restaurant::new(seed.name, seed.address, seed.country);
        restaurant.description = seed.description.to_string();
        restaurant.phone_number = seed.phone.to_string();
        restaurant.email = seed.email.to_string();
        restaurant.owner_id = Some(data.user(seed.owner).ok_or_else(|| missing(seed.owner))?.id);
        repos.restaurants.save(&restaurant).await?;

        for (category_name, display_order, items) in seed.menu {
            let category = MenuCategory::new(restaurant.id, *category_name, *display_order);
            repos.categories.save(&category).await?;

            for entry in items.iter() {
                let price = Money::from_minor(entry.price_minor)
                    .map_err(|e| RepositoryError::Conflict(e.to_string()))?;
                let mut menu_item = MenuItem::new(category.id, entry.name, price);
                menu_item.description = entry.description.to_string();
                menu_item.is_vegetarian = entry.vegetarian;
                menu_item.is_vegan = entry.vegan;
                menu_item.preparation_time_minutes = entry.preparation_minutes;
                repos.items.save(&menu_item).await?;
                data.items.push(menu_item);
            }
            data.categories.push(category);
        }
        data.restaurants.push(restaurant);
    }

    let methods: [(&str, PaymentType, Option<(&str, &str)>, Option<&str>); 3] = [
        ("nick_fury", PaymentType::CreditCard, Some(("1234", "Visa")), None),
        ("captain_marvel", PaymentType::Upi, None, Some("captain_marvel@upi")),
        ("captain_america", PaymentType::DebitCard, Some(("5678", "Mastercard")), None),
    ];
    for (username, payment_type, card, upi) in methods {
        let owner = data.user(username).ok_or_else(|| missing(username))?;
        let mut method = PaymentMethod::new(owner.id, payment_type);
        method.is_default = true;
        method.card_last4 = card.map(|(last4, _)| last4.to_string());
        method.card_brand = card.map(|(_, brand)| brand.to_string());
        method.upi_id = upi.map(str::to_string);
        repos.payments.create(&method).await?;
        data.payment_methods.push(method);
    }

    let delivered = sample_order(
        &data,
        "thanos",
        "Taj Mahal Restaurant",
        "Titan Tower, Mumbai, India",
        &["Samosa", "Paneer Butter Masala"],
        OrderStatus::Delivered,
    )?;
    let confirmed = sample_order(
        &data,
        "travis",
        "Burger Palace",
        "Stark Tower, New York, USA",
        &["Classic Cheeseburger", "French Fries"],
        OrderStatus::Confirmed,
    )?;
    for order in [delivered, confirmed] {
        repos.orders.create_with_items(&order).await?;
        data.orders.push(order);
    }

    info!(
        "Seeded {} users, {} restaurants, {} menu items, {} payment methods, {} orders",
        data.users.len(),
        data.restaurants.len(),
        data.items.len(),
        data.payment_methods.len(),
        data.orders.len()
    );
    Ok(data)
}

fn sample_order(
    data: &DemoData,
    username: &str,
    restaurant: &str,
    address: &str,
    items: &[&str],
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    let user = data.user(username).ok_or_else(|| missing(username))?;
    let restaurant = data.restaurant(restaurant).ok_or_else(|| missing(restaurant))?;
    let lines = items
        .iter()
        .map(|name| {
            let menu_item = data.item(name).ok_or_else(|| missing(name))?;
            Ok(OrderLine {
                menu_item_id: menu_item.id,
                unit_price: menu_item.price,
                quantity: 1,
                special_instructions: None,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

    let mut order = Order::new(user.id, restaurant.id, restaurant.country(), address, lines).map_err(seed_order)?;
    let path = [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];
    for next in path {
        if order.status() == status {
            break;
        }
        order.transition_to(next).map_err(seed_order)?;
    }
    Ok(order)
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixture: in-memory services loaded with the demo data set.

#![allow(dead_code)]

use food_ordering_core::application::order::{CreateOrder, OrderLineRequest};
use food_ordering_core::application::seed::{seed_demo_data, DemoData};
use food_ordering_core::application::{Repositories, Services};
use food_ordering_core::infrastructure::event_bus::EventBus;
use food_ordering_core::domain::actor::Actor;
use food_ordering_core::domain::order::Order;

pub struct Fixture {
    pub services: Services,
    pub data: DemoData,
}

impl Fixture {
    pub async fn seeded() -> Self {
        Self::seeded_with(|repositories| repositories).await
    }

    /// Seeded fixture whose services run over repositories rewrapped by `wrap`.
    pub async fn seeded_with(wrap: impl FnOnce(Repositories) -> Repositories) -> Self {
        let repositories = Repositories::in_memory();
        let data = seed_demo_data(&repositories).await.expect("seed demo data");
        let services = Services::new(wrap(repositories), EventBus::with_default_capacity());
        Self { services, data }
    }

    pub fn actor(&self, username: &str) -> Actor {
        self.data
            .user(username)
            .unwrap_or_else(|| panic!("no demo user {username}"))
            .actor()
    }

    /// Order request for one of each named item at `restaurant`.
    pub fn order_request(&self, restaurant: &str, items: &[(&str, u32)]) -> CreateOrder {
        CreateOrder {
            restaurant_id: self.data.restaurant(restaurant).expect("demo restaurant").id,
            delivery_address: "42 Test Street".to_string(),
            payment_method_id: None,
            special_instructions: None,
            items: items
                .iter()
                .map(|(name, quantity)| OrderLineRequest {
                    menu_item_id: self.data.item(name).expect("demo item").id,
                    quantity: *quantity,
                    special_instructions: None,
                })
                .collect(),
        }
    }

    /// A fresh PENDING order created by `username`.
    pub async fn pending_order(&self, username: &str, restaurant: &str, items: &[(&str, u32)]) -> Order {
        self.services
            .orders
            .create_order(&self.actor(username), self.order_request(restaurant, items))
            .await
            .expect("create order")
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Service registry: every application service wired to one repository set,
//! one policy service and one event bus.

use std::sync::Arc;

use crate::application::catalog::{CatalogService, StandardCatalogService};
use crate::application::order::{OrderService, StandardOrderService};
use crate::application::payment::{PaymentService, StandardPaymentService};
use crate::application::policy::PolicyService;
use crate::application::repository_factory::Repositories;
use crate::application::user::{StandardUserService, UserService};
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserService>,
    pub catalog: Arc<dyn CatalogService>,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentService>,
    pub policy: PolicyService,
    pub event_bus: EventBus,
    pub repositories: Repositories,
}

impl Services {
    pub fn new(repositories: Repositories, event_bus: EventBus) -> Self {
        let policy = PolicyService::new(event_bus.clone());
        let users = Arc::new(StandardUserService::new(repositories.users.clone(), policy.clone()));
        let catalog = Arc::new(StandardCatalogService::new(
            repositories.restaurants.clone(),
            repositories.categories.clone(),
            repositories.items.clone(),
            policy.clone(),
        ));
        let orders = Arc::new(StandardOrderService::new(
            repositories.orders.clone(),
            repositories.restaurants.clone(),
            repositories.categories.clone(),
            repositories.items.clone(),
            repositories.payments.clone(),
            policy.clone(),
            event_bus.clone(),
        ));
        let payments = Arc::new(StandardPaymentService::new(
            repositories.payments.clone(),
            policy.clone(),
            event_bus.clone(),
        ));

        Self {
            users,
            catalog,
            orders,
            payments,
            policy,
            event_bus,
            repositories,
        }
    }

    /// In-memory services with a default-capacity event bus.
    pub fn in_memory() -> Self {
        Self::new(Repositories::in_memory(), EventBus::with_default_capacity())
    }
}

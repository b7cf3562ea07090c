// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Order Service
//!
//! Order creation, checkout, cancellation and status changes.
//!
//! Every state change follows the same sequence:
//!
//! 1. role check (`Forbidden` when the role may never do this)
//! 2. scoped load (`NotFound` when the order is missing or out of scope)
//! 3. record check against the loaded order
//! 4. state machine check (`InvalidTransition`)
//! 5. conditional status write, then publish `OrderStatusChanged`
//!
//! The write in step 5 only lands if the stored status is still the one read
//! in step 2. A concurrent writer that got there first turns the late request
//! into `InvalidTransition` against the status it actually left behind.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::error::ServiceError;
use crate::application::policy::PolicyService;
use crate::domain::actor::Actor;
use crate::domain::events::OrderEvent;
use crate::domain::ids::{MenuItemId, OrderId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::order::{Order, OrderError, OrderFilter, OrderItem, OrderLine, OrderStatus};
use crate::domain::policy::{Action, RecordRef};
use crate::domain::repository::{
    MenuCategoryRepository, MenuItemRepository, OrderRepository, PaymentMethodRepository, RestaurantRepository,
    StatusSwap,
};
use crate::domain::resource::{NoRelations, Predicate, ResourceKind};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineRequest {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Payload for [`OrderService::create_order`]. Owner and country are taken
/// from the actor, never from the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    pub restaurant_id: RestaurantId,
    pub delivery_address: String,
    #[serde(default)]
    pub payment_method_id: Option<PaymentMethodId>,
    #[serde(default)]
    pub special_instructions: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

/// Admin-only raw update of the free-text fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub payment_method_id: Option<PaymentMethodId>,
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn list_orders(&self, actor: &Actor, filter: OrderFilter) -> Result<Vec<Order>, ServiceError>;
    /// The actor's own orders, whatever their role.
    async fn my_orders(&self, actor: &Actor, filter: OrderFilter) -> Result<Vec<Order>, ServiceError>;
    async fn get_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError>;
    async fn list_order_items(&self, actor: &Actor) -> Result<Vec<OrderItem>, ServiceError>;
    async fn create_order(&self, actor: &Actor, request: CreateOrder) -> Result<Order, ServiceError>;
    async fn place_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError>;
    async fn cancel_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError>;
    async fn update_order_status(&self, actor: &Actor, id: OrderId, status: OrderStatus)
        -> Result<Order, ServiceError>;
    async fn update_order(&self, actor: &Actor, id: OrderId, update: OrderUpdate) -> Result<Order, ServiceError>;
    async fn delete_order(&self, actor: &Actor, id: OrderId) -> Result<(), ServiceError>;
}

pub struct StandardOrderService {
    orders: Arc<dyn OrderRepository>,
    restaurants: Arc<dyn RestaurantRepository>,
    categories: Arc<dyn MenuCategoryRepository>,
    items: Arc<dyn MenuItemRepository>,
    payments: Arc<dyn PaymentMethodRepository>,
    policy: PolicyService,
    event_bus: EventBus,
}

impl StandardOrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        restaurants: Arc<dyn RestaurantRepository>,
        categories: Arc<dyn MenuCategoryRepository>,
        items: Arc<dyn MenuItemRepository>,
        payments: Arc<dyn PaymentMethodRepository>,
        policy: PolicyService,
        event_bus: EventBus,
    ) -> Self {
        Self {
            orders,
            restaurants,
            categories,
            items,
            payments,
            policy,
            event_bus,
        }
    }

    async fn load(&self, actor: &Actor, action: Action, id: OrderId) -> Result<Order, ServiceError> {
        let kind = ResourceKind::Order;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let order = self
            .orders
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&order, &NoRelations)))?;
        Ok(order)
    }

    async fn transition<F>(&self, actor: &Actor, id: OrderId, action: Action, apply: F) -> Result<Order, ServiceError>
    where
        F: FnOnce(&mut Order) -> Result<(), OrderError> + Send,
    {
        let mut order = self.load(actor, action, id).await?;
        let from = order.status();
        apply(&mut order)?;
        let to = order.status();
        match self.orders.swap_status(order.id, from, to, order.updated_at).await? {
            StatusSwap::Applied => {}
            StatusSwap::Stale { current } => {
                warn!(
                    "Order {} changed to {} before {} could move it {} -> {}",
                    order.id,
                    current,
                    actor.username(),
                    from,
                    to
                );
                return Err(ServiceError::InvalidTransition { from: current, to });
            }
        }

        info!("Order {} moved {} -> {} by {}", order.id, from, order.status(), actor.username());
        self.event_bus.publish_order_event(OrderEvent::OrderStatusChanged {
            order_id: order.id,
            from,
            to: order.status(),
            changed_by: actor.id(),
            changed_at: Utc::now(),
        });
        Ok(order)
    }

    /// Price every requested line against the live catalog. Each item must
    /// be visible to the actor, available, and on the menu of `restaurant_id`.
    async fn price_lines(
        &self,
        actor: &Actor,
        restaurant_id: RestaurantId,
        requested: Vec<OrderLineRequest>,
    ) -> Result<Vec<OrderLine>, ServiceError> {
        let item_scope = self.policy.scope(actor, ResourceKind::MenuItem);
        let mut lines = Vec::with_capacity(requested.len());
        for line in requested {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity(line.menu_item_id).into());
            }
            let item = self
                .items
                .find_in_scope(line.menu_item_id, &item_scope)
                .await?
                .ok_or_else(|| ServiceError::invalid(format!("Menu item {} is not available", line.menu_item_id)))?;
            if !item.is_available {
                return Err(ServiceError::invalid(format!("Menu item '{}' is not available", item.name)));
            }
            let belongs = self
                .categories
                .find_in_scope(item.category_id, &Predicate::All)
                .await?
                .is_some_and(|category| category.restaurant_id == restaurant_id);
            if !belongs {
                return Err(ServiceError::invalid(format!(
                    "Menu item '{}' does not belong to restaurant {}",
                    item.name, restaurant_id
                )));
            }
            lines.push(OrderLine {
                menu_item_id: item.id,
                unit_price: item.price,
                quantity: line.quantity,
                special_instructions: line.special_instructions,
            });
        }
        Ok(lines)
    }

    /// The payment method must belong to `owner`, whoever is acting.
    async fn require_payment_method_of(&self, owner: UserId, id: PaymentMethodId) -> Result<(), ServiceError> {
        let owned = Predicate::owned_by(ResourceKind::PaymentMethod, "user_id", owner);
        self.payments
            .find_in_scope(id, &owned)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::invalid(format!("Payment method {id} does not belong to the order owner")))
    }
}

#[async_trait]
impl OrderService for StandardOrderService {
    async fn list_orders(&self, actor: &Actor, filter: OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let kind = ResourceKind::Order;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.orders.list(&scope, &filter).await?)
    }

    async fn my_orders(&self, actor: &Actor, filter: OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let kind = ResourceKind::Order;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let filter = OrderFilter {
            user_id: Some(actor.id()),
            ..filter
        };
        Ok(self.orders.list(&scope, &filter).await?)
    }

    async fn get_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError> {
        self.load(actor, Action::Retrieve, id).await
    }

    async fn list_order_items(&self, actor: &Actor) -> Result<Vec<OrderItem>, ServiceError> {
        let kind = ResourceKind::OrderItem;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.orders.list_items(&scope).await?)
    }

    async fn create_order(&self, actor: &Actor, request: CreateOrder) -> Result<Order, ServiceError> {
        let kind = ResourceKind::Order;
        self.policy.require(actor, Action::Create, kind, None)?;

        let country = actor
            .country()
            .ok_or_else(|| ServiceError::invalid("An actor without a country cannot create orders"))?;
        if request.items.is_empty() {
            return Err(OrderError::EmptyOrder.into());
        }
        if request.delivery_address.trim().is_empty() {
            return Err(ServiceError::invalid("delivery_address is required"));
        }

        let restaurant_scope = self.policy.scope(actor, ResourceKind::Restaurant);
        let restaurant = self
            .restaurants
            .find_in_scope(request.restaurant_id, &restaurant_scope)
            .await?
            .filter(|r| r.is_active)
            .ok_or_else(|| ServiceError::invalid(format!("Restaurant {} is not available", request.restaurant_id)))?;

        if let Some(payment_method_id) = request.payment_method_id {
            self.require_payment_method_of(actor.id(), payment_method_id).await?;
        }

        let lines = self.price_lines(actor, restaurant.id, request.items).await?;
        let mut order = Order::new(actor.id(), restaurant.id, country, request.delivery_address, lines)?;
        order.payment_method_id = request.payment_method_id;
        order.special_instructions = request.special_instructions;

        self.policy
            .require(actor, Action::Create, kind, Some(RecordRef::new(&order, &NoRelations)))?;
        self.orders.create_with_items(&order).await?;

        info!(
            "Order {} created by {} at {} ({} items, total {})",
            order.id,
            actor.username(),
            restaurant.name,
            order.items().len(),
            order.total_amount()
        );
        self.event_bus.publish_order_event(OrderEvent::OrderCreated {
            order_id: order.id,
            user_id: order.user_id,
            restaurant_id: order.restaurant_id,
            country: order.country(),
            total_amount: order.total_amount(),
            item_count: order.items().len(),
            created_at: order.created_at,
        });
        Ok(order)
    }

    async fn place_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError> {
        self.transition(actor, id, Action::PlaceOrder, |order| order.place()).await
    }

    async fn cancel_order(&self, actor: &Actor, id: OrderId) -> Result<Order, ServiceError> {
        self.transition(actor, id, Action::CancelOrder, |order| order.cancel()).await
    }

    async fn update_order_status(
        &self,
        actor: &Actor,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ServiceError> {
        self.transition(actor, id, Action::UpdateStatus, move |order| order.transition_to(status))
            .await
    }

    async fn update_order(&self, actor: &Actor, id: OrderId, update: OrderUpdate) -> Result<Order, ServiceError> {
        let mut order = self.load(actor, Action::Update, id).await?;
        if let Some(address) = update.delivery_address {
            if address.trim().is_empty() {
                return Err(ServiceError::invalid("delivery_address cannot be empty"));
            }
            order.delivery_address = address;
        }
        if let Some(instructions) = update.special_instructions {
            order.special_instructions = Some(instructions);
        }
        if let Some(payment_method_id) = update.payment_method_id {
            self.require_payment_method_of(order.user_id, payment_method_id).await?;
            order.payment_method_id = Some(payment_method_id);
        }
        order.updated_at = Utc::now();
        self.orders.save(&order).await?;
        Ok(order)
    }

    async fn delete_order(&self, actor: &Actor, id: OrderId) -> Result<(), ServiceError> {
        let order = self.load(actor, Action::Delete, id).await?;
        self.orders.delete(order.id).await?;
        info!("Order {} deleted by {}", order.id, actor.username());
        self.event_bus.publish_order_event(OrderEvent::OrderDeleted {
            order_id: order.id,
            deleted_by: actor.id(),
            deleted_at: Utc::now(),
        });
        Ok(())
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Order Aggregate
//!
//! An order is created with its lines in one step, so the total it carries is
//! always the sum of the line snapshots. Line prices are copied from the menu
//! at creation time and are never recalculated.
//!
//! ```text
//! PENDING ─▶ CONFIRMED ─▶ PREPARING ─▶ OUT_FOR_DELIVERY ─▶ DELIVERED
//!    │           │            │                │
//!    └───────────┴────────────┴────────────────┴──────────▶ CANCELLED
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::actor::Country;
use crate::domain::ids::{MenuItemId, OrderId, OrderItemId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::money::Money;
use crate::domain::resource::{AttrValue, Scoped};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("An order needs at least one item")]
    EmptyOrder,

    #[error("Quantity must be at least 1 (menu item {0})")]
    InvalidQuantity(MenuItemId),

    #[error("Order total overflows")]
    AmountOverflow,

    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Legal moves of the order state machine. Staying in place is not a move.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (*self, next) {
            (Pending, Confirmed)
            | (Confirmed, Preparing)
            | (Preparing, OutForDelivery)
            | (OutForDelivery, Delivered) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Priced line handed to [`Order::new`]. `unit_price` is the catalog price
/// read at creation time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub unit_price: Money,
    pub quantity: u32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    /// Price snapshot, independent of the live menu price.
    pub price: Money,
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn subtotal(&self) -> Option<Money> {
        self.price.checked_mul(self.quantity)
    }
}

impl Scoped for OrderItem {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "order_id" => Some(AttrValue::Id(self.order_id.as_uuid())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    status: OrderStatus,
    country: Country,
    total_amount: Money,
    pub delivery_address: String,
    pub payment_method_id: Option<PaymentMethodId>,
    pub special_instructions: Option<String>,
    items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a pending order. The total is computed from `lines` here and
    /// never again.
    pub fn new(
        user_id: UserId,
        restaurant_id: RestaurantId,
        country: Country,
        delivery_address: impl Into<String>,
        lines: Vec<OrderLine>,
    ) -> Result<Self, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let id = OrderId::new();
        let mut total = Money::ZERO;
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(OrderError::InvalidQuantity(line.menu_item_id));
            }
            let subtotal = line
                .unit_price
                .checked_mul(line.quantity)
                .ok_or(OrderError::AmountOverflow)?;
            total = total.checked_add(subtotal).ok_or(OrderError::AmountOverflow)?;
            items.push(OrderItem {
                id: OrderItemId::new(),
                order_id: id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                price: line.unit_price,
                special_instructions: line.special_instructions,
            });
        }

        let now = Utc::now();
        Ok(Self {
            id,
            user_id,
            restaurant_id,
            status: OrderStatus::Pending,
            country,
            total_amount: total,
            delivery_address: delivery_address.into(),
            payment_method_id: None,
            special_instructions: None,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild an order from storage without recomputing anything.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: OrderId,
        user_id: UserId,
        restaurant_id: RestaurantId,
        status: OrderStatus,
        country: Country,
        total_amount: Money,
        delivery_address: String,
        payment_method_id: Option<PaymentMethodId>,
        special_instructions: Option<String>,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            restaurant_id,
            status,
            country,
            total_amount,
            delivery_address,
            payment_method_id,
            special_instructions,
            items,
            created_at,
            updated_at,
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Checkout: `PENDING → CONFIRMED`.
    pub fn place(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: OrderStatus::Confirmed,
            });
        }
        self.apply(OrderStatus::Confirmed);
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), OrderError> {
        self.transition_to(OrderStatus::Cancelled)
    }

    /// Move to `next` if the state machine allows it.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.apply(next);
        Ok(())
    }

    /// Record a status that storage already accepted. Skips the state machine.
    pub fn restore_status(&mut self, status: OrderStatus, updated_at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = updated_at;
    }

    fn apply(&mut self, next: OrderStatus) {
        self.status = next;
        self.updated_at = Utc::now();
    }
}

impl Scoped for Order {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "user_id" => Some(AttrValue::Id(self.user_id.as_uuid())),
            "restaurant_id" => Some(AttrValue::Id(self.restaurant_id.as_uuid())),
            "country" => Some(AttrValue::Country(self.country)),
            _ => None,
        }
    }
}

/// Optional narrowing applied on top of the scope predicate when listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub restaurant_id: Option<RestaurantId>,
    pub user_id: Option<UserId>,
    pub country: Option<Country>,
    /// Matched against the owner's username and the restaurant name. Both
    /// live outside the order row, so repositories apply it themselves.
    pub search: Option<String>,
}

impl OrderFilter {
    /// Checks every field carried by the order row itself; `search` is not
    /// consulted here.
    pub fn admits(&self, order: &Order) -> bool {
        self.status.is_none_or(|status| order.status() == status)
            && self.restaurant_id.is_none_or(|id| order.restaurant_id == id)
            && self.user_id.is_none_or(|id| order.user_id == id)
            && self.country.is_none_or(|country| order.country() == country)
    }
}

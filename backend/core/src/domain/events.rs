// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::{Country, Role};
use crate::domain::ids::{OrderId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::money::Money;
use crate::domain::order::OrderStatus;
use crate::domain::policy::{Action, DecisionReason};
use crate::domain::resource::ResourceKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderCreated {
        order_id: OrderId,
        user_id: UserId,
        restaurant_id: RestaurantId,
        country: Country,
        total_amount: Money,
        item_count: usize,
        created_at: DateTime<Utc>,
    },
    OrderStatusChanged {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    },
    OrderDeleted {
        order_id: OrderId,
        deleted_by: UserId,
        deleted_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentEvent {
    PaymentMethodAdded {
        payment_method_id: PaymentMethodId,
        user_id: UserId,
        is_default: bool,
        added_at: DateTime<Utc>,
    },
    DefaultPaymentMethodChanged {
        payment_method_id: PaymentMethodId,
        user_id: UserId,
        changed_by: UserId,
        changed_at: DateTime<Utc>,
    },
    PaymentMethodRemoved {
        payment_method_id: PaymentMethodId,
        removed_by: UserId,
        removed_at: DateTime<Utc>,
    },
}

/// Audit trail of denied requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    AccessDenied {
        actor_id: UserId,
        role: Role,
        action: Action,
        resource: ResourceKind,
        reason: DecisionReason,
        denied_at: DateTime<Utc>,
    },
}

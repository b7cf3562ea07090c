// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Domain Events
//
// In-memory event streaming over tokio broadcast channels. Order, payment
// and policy-denial events are fanned out to every subscriber; nothing is
// persisted, so events published with no subscriber are dropped.

use crate::domain::events::{OrderEvent, PaymentEvent, PolicyEvent};
use crate::domain::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Unified domain event type for the event bus
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Order(OrderEvent),
    Payment(PaymentEvent),
    Policy(PolicyEvent),
}

/// Event bus for publishing and subscribing to domain events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity bounds how many events a slow subscriber may fall behind
    /// before old events are dropped for it.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_order_event(&self, event: OrderEvent) {
        self.publish(DomainEvent::Order(event));
    }

    pub fn publish_payment_event(&self, event: PaymentEvent) {
        self.publish(DomainEvent::Payment(event));
    }

    pub fn publish_policy_event(&self, event: PolicyEvent) {
        self.publish(DomainEvent::Policy(event));
    }

    fn publish(&self, event: DomainEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to the events of a single order.
    pub fn subscribe_order(&self, order_id: OrderId) -> OrderEventReceiver {
        OrderEventReceiver {
            receiver: self.sender.subscribe(),
            order_id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all domain events
pub struct EventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    pub fn try_recv(&mut self) -> Result<DomainEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one order
pub struct OrderEventReceiver {
    receiver: broadcast::Receiver<DomainEvent>,
    order_id: OrderId,
}

impl OrderEventReceiver {
    pub async fn recv(&mut self) -> Result<OrderEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if let DomainEvent::Order(order_event) = event {
                if self.matches_order(&order_event) {
                    return Ok(order_event);
                }
            }
        }
    }

    fn matches_order(&self, event: &OrderEvent) -> bool {
        match event {
            OrderEvent::OrderCreated { order_id, .. } => order_id == &self.order_id,
            OrderEvent::OrderStatusChanged { order_id, .. } => order_id == &self.order_id,
            OrderEvent::OrderDeleted { order_id, .. } => order_id == &self.order_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Role;
    use crate::domain::ids::UserId;
    use crate::domain::order::OrderStatus;
    use crate::domain::policy::{Action, DecisionReason};
    use crate::domain::resource::ResourceKind;
    use chrono::Utc;

    fn status_changed(order_id: OrderId) -> OrderEvent {
        OrderEvent::OrderStatusChanged {
            order_id,
            from: OrderStatus::Pending,
            to: OrderStatus::Confirmed,
            changed_by: UserId::new(),
            changed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let actor_id = UserId::new();
        event_bus.publish_policy_event(PolicyEvent::AccessDenied {
            actor_id,
            role: Role::Member,
            action: Action::Create,
            resource: ResourceKind::Order,
            reason: DecisionReason::RoleDenied,
            denied_at: Utc::now(),
        });

        match receiver.recv().await.unwrap() {
            DomainEvent::Policy(PolicyEvent::AccessDenied { actor_id: id, .. }) => assert_eq!(id, actor_id),
            other => panic!("Wrong event type received: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_order_event_filtering() {
        let event_bus = EventBus::new(10);
        let order_id = OrderId::new();
        let mut receiver = event_bus.subscribe_order(order_id);

        event_bus.publish_order_event(status_changed(OrderId::new()));
        event_bus.publish_order_event(status_changed(order_id));

        match receiver.recv().await.unwrap() {
            OrderEvent::OrderStatusChanged { order_id: id, .. } => assert_eq!(id, order_id),
            other => panic!("Wrong event type received: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.publish_order_event(status_changed(OrderId::new()));

        let _ = receiver1.recv().await.unwrap();
        let _ = receiver2.recv().await.unwrap();
    }

    #[test]
    fn test_try_recv_empty() {
        let event_bus = EventBus::new(4);
        let mut receiver = event_bus.subscribe();
        assert!(matches!(receiver.try_recv(), Err(EventBusError::Empty)));
    }
}

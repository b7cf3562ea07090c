// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Order lifecycle through the service layer: creation, checkout,
//! cancellation, status changes and price snapshots.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Fixture;
use food_ordering_core::application::catalog::MenuItemUpdate;
use food_ordering_core::application::order::OrderUpdate;
use food_ordering_core::application::payment::NewPaymentMethod;
use food_ordering_core::application::ServiceError;
use food_ordering_core::domain::events::OrderEvent;
use food_ordering_core::domain::ids::OrderId;
use food_ordering_core::domain::money::Money;
use food_ordering_core::domain::order::{Order, OrderFilter, OrderItem, OrderStatus};
use food_ordering_core::domain::payment::PaymentType;
use food_ordering_core::domain::policy::DecisionReason;
use food_ordering_core::domain::repository::{OrderRepository, RepositoryError, StatusSwap};
use food_ordering_core::domain::resource::Predicate;
use food_ordering_core::infrastructure::event_bus::DomainEvent;
use std::sync::Arc;
use std::time::Duration;

fn assert_invalid_transition(result: Result<impl std::fmt::Debug, ServiceError>, from: OrderStatus) {
    match result {
        Err(ServiceError::InvalidTransition { from: actual, .. }) => assert_eq!(actual, from),
        other => panic!("expected InvalidTransition from {from}, got {other:?}"),
    }
}

#[tokio::test]
async fn test_member_cannot_create_orders() {
    let fixture = Fixture::seeded().await;
    let thor = fixture.actor("thor");

    let err = fixture
        .services
        .orders
        .create_order(&thor, fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 1)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Forbidden {
            reason: DecisionReason::RoleDenied,
            ..
        }
    ));
}

#[tokio::test]
async fn test_manager_creates_pending_order_with_snapshot_total() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_marvel");

    let order = fixture
        .pending_order(
            "captain_marvel",
            "Taj Mahal Restaurant",
            &[("Samosa", 2), ("Chicken Tikka Masala", 1)],
        )
        .await;

    assert_eq!(order.status(), OrderStatus::Pending);
    assert_eq!(order.user_id, manager.id());
    assert_eq!(order.country(), manager.country().unwrap());
    assert_eq!(order.items().len(), 2);
    // 2 x 5.99 + 15.99
    assert_eq!(order.total_amount().to_string(), "27.97");

    let stored = fixture.services.orders.get_order(&manager, order.id).await.unwrap();
    assert_eq!(stored.total_amount(), order.total_amount());
    assert_eq!(stored.items().len(), 2);
}

#[tokio::test]
async fn test_total_survives_menu_price_change() {
    let fixture = Fixture::seeded().await;
    let admin = fixture.actor("nick_fury");
    let manager = fixture.actor("captain_marvel");

    let order = fixture
        .pending_order("captain_marvel", "Taj Mahal Restaurant", &[("Samosa", 3)])
        .await;
    assert_eq!(order.total_amount().to_string(), "17.97");

    let samosa = fixture.data.item("Samosa").unwrap().id;
    let repriced = fixture
        .services
        .catalog
        .update_menu_item(
            &admin,
            samosa,
            MenuItemUpdate {
                price: Some(Money::from_minor(999).unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(repriced.price.to_string(), "9.99");

    let stored = fixture.services.orders.get_order(&manager, order.id).await.unwrap();
    assert_eq!(stored.total_amount().to_string(), "17.97");
    assert_eq!(stored.items()[0].price.to_string(), "5.99");

    let seeded = fixture.services.orders.get_order(&admin, fixture.data.orders[0].id).await.unwrap();
    assert_eq!(seeded.total_amount().to_string(), "18.98");
}

#[tokio::test]
async fn test_create_order_rejects_bad_requests() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_marvel");
    let orders = &fixture.services.orders;

    let empty = fixture.order_request("Taj Mahal Restaurant", &[]);
    assert!(matches!(
        orders.create_order(&manager, empty).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    let mut blank_address = fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 1)]);
    blank_address.delivery_address = "   ".to_string();
    assert!(matches!(
        orders.create_order(&manager, blank_address).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    let zero = fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 0)]);
    assert!(matches!(
        orders.create_order(&manager, zero).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    // Item from another restaurant's menu.
    let mixed = fixture.order_request("Taj Mahal Restaurant", &[("Masala Dosa", 1)]);
    assert!(matches!(
        orders.create_order(&manager, mixed).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    // Restaurant outside the manager's country.
    let foreign = fixture.order_request("Burger Palace", &[("French Fries", 1)]);
    assert!(matches!(
        orders.create_order(&manager, foreign).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    // Someone else's payment method.
    let mut borrowed = fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 1)]);
    borrowed.payment_method_id = Some(fixture.data.payment_methods[0].id);
    assert!(matches!(
        orders.create_order(&manager, borrowed).await,
        Err(ServiceError::ValidationFailed(_))
    ));

    let all = orders.list_orders(&manager, OrderFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1, "only the seeded Indian order exists");
}

#[tokio::test]
async fn test_unavailable_item_cannot_be_ordered() {
    let fixture = Fixture::seeded().await;
    let admin = fixture.actor("nick_fury");
    let manager = fixture.actor("captain_marvel");
    let samosa = fixture.data.item("Samosa").unwrap().id;

    fixture
        .services
        .catalog
        .update_menu_item(
            &admin,
            samosa,
            MenuItemUpdate {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let request = fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 1)]);
    assert!(matches!(
        fixture.services.orders.create_order(&manager, request).await,
        Err(ServiceError::ValidationFailed(_))
    ));
}

#[tokio::test]
async fn test_own_payment_method_is_accepted() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_marvel");
    let upi = fixture
        .data
        .payment_methods
        .iter()
        .find(|m| m.user_id == manager.id())
        .unwrap()
        .id;

    let mut request = fixture.order_request("Spice Garden", &[("Idli Sambar", 2)]);
    request.payment_method_id = Some(upi);
    let order = fixture.services.orders.create_order(&manager, request).await.unwrap();
    assert_eq!(order.payment_method_id, Some(upi));
}

#[tokio::test]
async fn test_place_order_once() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_america");
    let order = fixture
        .pending_order("captain_america", "Burger Palace", &[("Veggie Burger", 1)])
        .await;

    let placed = fixture.services.orders.place_order(&manager, order.id).await.unwrap();
    assert_eq!(placed.status(), OrderStatus::Confirmed);

    assert_invalid_transition(
        fixture.services.orders.place_order(&manager, order.id).await,
        OrderStatus::Confirmed,
    );
}

#[tokio::test]
async fn test_cancel_delivered_order() {
    let fixture = Fixture::seeded().await;
    let delivered = fixture.data.orders[0].id;

    for username in ["nick_fury", "captain_marvel"] {
        assert_invalid_transition(
            fixture
                .services
                .orders
                .cancel_order(&fixture.actor(username), delivered)
                .await,
            OrderStatus::Delivered,
        );
    }

    // Out of scope is reported before the state machine is consulted.
    assert!(matches!(
        fixture
            .services
            .orders
            .cancel_order(&fixture.actor("captain_america"), delivered)
            .await,
        Err(ServiceError::NotFound { .. })
    ));

    let thanos = fixture.actor("thanos");
    assert!(matches!(
        fixture.services.orders.cancel_order(&thanos, delivered).await,
        Err(ServiceError::Forbidden {
            reason: DecisionReason::RoleDenied,
            ..
        })
    ));
}

#[tokio::test]
async fn test_cancel_twice() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_america");
    let confirmed = fixture.data.orders[1].id;

    let cancelled = fixture.services.orders.cancel_order(&manager, confirmed).await.unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    assert_invalid_transition(
        fixture.services.orders.cancel_order(&manager, confirmed).await,
        OrderStatus::Cancelled,
    );
    assert_invalid_transition(
        fixture
            .services
            .orders
            .cancel_order(&fixture.actor("nick_fury"), confirmed)
            .await,
        OrderStatus::Cancelled,
    );
}

#[tokio::test]
async fn test_status_walks_the_state_machine() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_america");
    let order = fixture
        .pending_order("captain_america", "Pizza Heaven", &[("Pepperoni Pizza", 1)])
        .await;
    let orders = &fixture.services.orders;

    assert_invalid_transition(
        orders.update_order_status(&manager, order.id, OrderStatus::Delivered).await,
        OrderStatus::Pending,
    );
    assert_invalid_transition(
        orders.update_order_status(&manager, order.id, OrderStatus::Pending).await,
        OrderStatus::Pending,
    );

    for next in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ] {
        let updated = orders.update_order_status(&manager, order.id, next).await.unwrap();
        assert_eq!(updated.status(), next);
    }

    assert_invalid_transition(
        orders.update_order_status(&manager, order.id, OrderStatus::Preparing).await,
        OrderStatus::Delivered,
    );
}

#[tokio::test]
async fn test_status_changes_are_published() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_marvel");
    let order = fixture
        .pending_order("captain_marvel", "Spice Garden", &[("Masala Dosa", 1)])
        .await;

    let mut receiver = fixture.services.event_bus.subscribe_order(order.id);
    fixture.services.orders.place_order(&manager, order.id).await.unwrap();

    match receiver.recv().await.unwrap() {
        OrderEvent::OrderStatusChanged { from, to, changed_by, .. } => {
            assert_eq!(from, OrderStatus::Pending);
            assert_eq!(to, OrderStatus::Confirmed);
            assert_eq!(changed_by, manager.id());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_attempts_are_audited() {
    let fixture = Fixture::seeded().await;
    let mut receiver = fixture.services.event_bus.subscribe();

    let thor = fixture.actor("thor");
    let _ = fixture
        .services
        .orders
        .create_order(&thor, fixture.order_request("Taj Mahal Restaurant", &[("Samosa", 1)]))
        .await;

    assert!(matches!(receiver.try_recv(), Ok(DomainEvent::Policy(_))));
}

#[tokio::test]
async fn test_my_orders_and_filters() {
    let fixture = Fixture::seeded().await;
    let manager = fixture.actor("captain_america");
    let own = fixture
        .pending_order("captain_america", "Burger Palace", &[("French Fries", 2)])
        .await;
    let orders = &fixture.services.orders;

    let mine = orders.my_orders(&manager, OrderFilter::default()).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, own.id);

    let confirmed = orders
        .list_orders(
            &manager,
            OrderFilter {
                status: Some(OrderStatus::Confirmed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, fixture.data.orders[1].id);

    let travis = fixture.actor("travis");
    let travis_orders = orders.my_orders(&travis, OrderFilter::default()).await.unwrap();
    assert_eq!(travis_orders.len(), 1);
}

#[tokio::test]
async fn test_only_admin_edits_and_deletes_orders() {
    let fixture = Fixture::seeded().await;
    let admin = fixture.actor("nick_fury");
    let manager = fixture.actor("captain_america");
    let target = fixture.data.orders[1].id;
    let orders = &fixture.services.orders;

    let update = OrderUpdate {
        delivery_address: Some("1 New Address".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        orders.update_order(&manager, target, update.clone()).await,
        Err(ServiceError::Forbidden { .. })
    ));
    let updated = orders.update_order(&admin, target, update).await.unwrap();
    assert_eq!(updated.delivery_address, "1 New Address");
    assert_eq!(updated.total_amount().to_string(), "17.98");

    assert!(matches!(
        orders.delete_order(&manager, target).await,
        Err(ServiceError::Forbidden { .. })
    ));
    orders.delete_order(&admin, target).await.unwrap();
    assert!(matches!(
        orders.get_order(&admin, target).await,
        Err(ServiceError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_admin_update_keeps_payment_method_with_order_owner() {
    let fixture = Fixture::seeded().await;
    let admin = fixture.actor("nick_fury");
    let travis = fixture.actor("travis");
    let target = fixture.data.orders[1].id;
    let orders = &fixture.services.orders;

    let admins_card = fixture
        .data
        .payment_methods
        .iter()
        .find(|m| m.user_id == admin.id())
        .unwrap()
        .id;
    let foreign = OrderUpdate {
        payment_method_id: Some(admins_card),
        ..Default::default()
    };
    assert!(matches!(
        orders.update_order(&admin, target, foreign).await,
        Err(ServiceError::ValidationFailed(_))
    ));
    assert_eq!(orders.get_order(&admin, target).await.unwrap().payment_method_id, None);

    let wallet = fixture
        .services
        .payments
        .create_payment_method(
            &travis,
            NewPaymentMethod {
                payment_type: PaymentType::Wallet,
                is_default: false,
                card_last4: None,
                card_brand: None,
                upi_id: None,
            },
        )
        .await
        .unwrap();
    let own = OrderUpdate {
        payment_method_id: Some(wallet.id),
        ..Default::default()
    };
    let updated = orders.update_order(&admin, target, own).await.unwrap();
    assert_eq!(updated.payment_method_id, Some(wallet.id));
    assert_eq!(updated.status(), OrderStatus::Confirmed);
}

/// Holds every scoped order read for a moment, so concurrent requests all
/// load the order before any of them writes.
struct SlowOrderReads {
    inner: Arc<dyn OrderRepository>,
}

#[async_trait]
impl OrderRepository for SlowOrderReads {
    async fn create_with_items(&self, order: &Order) -> Result<(), RepositoryError> {
        self.inner.create_with_items(order).await
    }

    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        self.inner.save(order).await
    }

    async fn swap_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<StatusSwap, RepositoryError> {
        self.inner.swap_status(id, expected, next, at).await
    }

    async fn find_in_scope(&self, id: OrderId, scope: &Predicate) -> Result<Option<Order>, RepositoryError> {
        let order = self.inner.find_in_scope(id, scope).await?;
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(order)
    }

    async fn list(&self, scope: &Predicate, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        self.inner.list(scope, filter).await
    }

    async fn list_items(&self, scope: &Predicate) -> Result<Vec<OrderItem>, RepositoryError> {
        self.inner.list_items(scope).await
    }

    async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        self.inner.delete(id).await
    }
}

async fn slow_fixture() -> Fixture {
    Fixture::seeded_with(|mut repositories| {
        repositories.orders = Arc::new(SlowOrderReads {
            inner: repositories.orders,
        });
        repositories
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_place_confirms_once() {
    let fixture = slow_fixture().await;
    let manager = fixture.actor("captain_america");
    let order = fixture
        .pending_order("captain_america", "Burger Palace", &[("Veggie Burger", 1)])
        .await;

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let services = fixture.services.clone();
            let manager = manager.clone();
            tokio::spawn(async move { services.orders.place_order(&manager, order.id).await })
        })
        .collect();

    let mut placed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(order) => {
                assert_eq!(order.status(), OrderStatus::Confirmed);
                placed += 1;
            }
            other => assert_invalid_transition(other, OrderStatus::Confirmed),
        }
    }
    assert_eq!(placed, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delivery_and_cancel_race_has_one_winner() {
    let fixture = slow_fixture().await;
    let manager = fixture.actor("captain_america");
    let order = fixture
        .pending_order("captain_america", "Pizza Heaven", &[("Pepperoni Pizza", 1)])
        .await;
    for next in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OutForDelivery,
    ] {
        fixture
            .services
            .orders
            .update_order_status(&manager, order.id, next)
            .await
            .unwrap();
    }

    let deliver = {
        let services = fixture.services.clone();
        let manager = manager.clone();
        tokio::spawn(async move {
            services
                .orders
                .update_order_status(&manager, order.id, OrderStatus::Delivered)
                .await
        })
    };
    let cancel = {
        let services = fixture.services.clone();
        let manager = manager.clone();
        tokio::spawn(async move { services.orders.cancel_order(&manager, order.id).await })
    };
    let delivered = deliver.await.unwrap();
    let cancelled = cancel.await.unwrap();
    assert!(
        delivered.is_ok() != cancelled.is_ok(),
        "exactly one writer must win: {delivered:?} / {cancelled:?}"
    );

    let stored = fixture.services.orders.get_order(&manager, order.id).await.unwrap();
    if delivered.is_ok() {
        assert_eq!(stored.status(), OrderStatus::Delivered);
        assert_invalid_transition(cancelled, OrderStatus::Delivered);
    } else {
        assert_eq!(stored.status(), OrderStatus::Cancelled);
        assert_invalid_transition(delivered, OrderStatus::Cancelled);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP surface: bearer authentication and the status codes each service
//! error maps to.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::Fixture;
use food_ordering_core::domain::identity::IdentityProvider;
use food_ordering_core::infrastructure::JwtIdentityProvider;
use food_ordering_core::presentation::api::{app, AppState};

const SECRET: &str = "api-test-secret";

struct Harness {
    fixture: Fixture,
    identity: Arc<JwtIdentityProvider>,
    router: Router,
}

impl Harness {
    async fn new() -> Self {
        let fixture = Fixture::seeded().await;
        let identity = Arc::new(JwtIdentityProvider::new(
            SECRET,
            60,
            fixture.services.repositories.users.clone(),
        ));
        let router = app(AppState::new(fixture.services.clone(), identity.clone()));
        Self {
            fixture,
            identity,
            router,
        }
    }

    fn token(&self, username: &str) -> String {
        let user = self.fixture.data.user(username).expect("demo user");
        self.identity.issue_token(user).expect("issue token")
    }

    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn get(&self, uri: &str, as_user: &str) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.call(Method::GET, uri, Some(&token), None).await
    }

    async fn post(&self, uri: &str, as_user: &str, body: Value) -> (StatusCode, Value) {
        let token = self.token(as_user);
        self.call(Method::POST, uri, Some(&token), Some(body)).await
    }
}

#[tokio::test]
async fn test_health_needs_no_credentials() {
    let harness = Harness::new().await;
    let (status, body) = harness.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_and_bad_credentials() {
    let harness = Harness::new().await;

    let (status, body) = harness.call(Method::GET, "/api/restaurants", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");

    let (status, _) = harness
        .call(Method::GET, "/api/restaurants", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = JwtIdentityProvider::new("other-secret", 60, harness.fixture.services.repositories.users.clone())
        .issue_token(harness.fixture.data.user("nick_fury").unwrap())
        .unwrap();
    let (status, _) = harness
        .call(Method::GET, "/api/restaurants", Some(&forged), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let harness = Harness::new().await;
    let stale = JwtIdentityProvider::new(SECRET, -10, harness.fixture.services.repositories.users.clone())
        .issue_token(harness.fixture.data.user("thor").unwrap())
        .unwrap();

    let (status, _) = harness
        .call(Method::GET, "/api/users/me", Some(&stale), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_restaurant_listing_is_country_scoped() {
    let harness = Harness::new().await;

    let (status, body) = harness.get("/api/restaurants", "thor").await;
    assert_eq!(status, StatusCode::OK);
    let countries: Vec<_> = body.as_array().unwrap().iter().map(|r| r["country"].clone()).collect();
    assert_eq!(countries.len(), 2);
    assert!(countries.iter().all(|c| c == "INDIA"));

    let (_, body) = harness.get("/api/restaurants", "nick_fury").await;
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_register_and_login_issue_working_tokens() {
    let harness = Harness::new().await;

    let registration = json!({
        "username": "gamora",
        "email": "gamora@example.com",
        "password": "daughter-of-titan",
        "country": "INDIA",
        "role": "admin",
    });
    let (status, body) = harness
        .call(Method::POST, "/api/users/register", None, Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["username"], "gamora");
    assert_eq!(body["user"]["role"], "member");
    assert_eq!(body["user"]["country"], "INDIA");
    assert!(body["user"].get("password_hash").is_none());

    let access = body["access"].as_str().unwrap().to_string();
    let (status, body) = harness.call(Method::GET, "/api/restaurants", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().iter().all(|r| r["country"] == "INDIA"));

    for path in ["/api/users/login", "/api/token"] {
        let (status, body) = harness
            .call(
                Method::POST,
                path,
                None,
                Some(json!({ "username": "gamora", "password": "daughter-of-titan" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{path}");
        let access = body["access"].as_str().unwrap();
        let (_, me) = harness.call(Method::GET, "/api/users/me", Some(access), None).await;
        assert_eq!(me["username"], "gamora");
    }

    let (status, _) = harness
        .call(Method::POST, "/api/users/register", None, Some(registration))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bad_passwords_are_rejected() {
    let harness = Harness::new().await;

    let (status, body) = harness
        .call(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "nebula", "password": "short", "country": "AMERICA" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failed");

    harness
        .call(
            Method::POST,
            "/api/users/register",
            None,
            Some(json!({ "username": "nebula", "password": "long-enough-secret", "country": "AMERICA" })),
        )
        .await;

    let attempts = [
        json!({ "username": "nebula", "password": "long-enough-secreT" }),
        json!({ "username": "nobody", "password": "long-enough-secret" }),
        // Demo accounts carry no password.
        json!({ "username": "thor", "password": "long-enough-secret" }),
    ];
    for attempt in attempts {
        let (status, body) = harness
            .call(Method::POST, "/api/users/login", None, Some(attempt.clone()))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{attempt}");
        assert_eq!(body["code"], "invalid_credentials");
    }
}

#[tokio::test]
async fn test_token_verify_endpoint() {
    let harness = Harness::new().await;
    let token = harness.token("captain_marvel");

    let (status, body) = harness
        .call(Method::POST, "/api/token/verify", None, Some(json!({ "token": token })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "captain_marvel");
    assert_eq!(body["role"], "manager");

    let (status, _) = harness
        .call(Method::POST, "/api/token/verify", None, Some(json!({ "token": "garbage" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_query_parameters_narrow_results() {
    let harness = Harness::new().await;

    let (status, body) = harness.get("/api/restaurants?country=AMERICA", "thor").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = harness.get("/api/restaurants?search=new%20york", "nick_fury").await;
    let names: Vec<_> = body.as_array().unwrap().iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("Burger Palace"), json!("Pizza Heaven")]);

    let (status, body) = harness
        .get("/api/menu-items?is_vegetarian=false&search=masala", "thanos")
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Chicken Tikka Masala");

    let (status, body) = harness.get("/api/orders?search=palace", "captain_america").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = harness.get("/api/restaurants?is_active=sometimes", "thor").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_reflects_token_subject() {
    let harness = Harness::new().await;
    let (status, body) = harness.get("/api/users/me", "captain_marvel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "captain_marvel");
    assert_eq!(body["role"], "manager");
}

#[tokio::test]
async fn test_member_order_creation_is_forbidden() {
    let harness = Harness::new().await;
    let taj = harness.fixture.data.restaurant("Taj Mahal Restaurant").unwrap().id;
    let samosa = harness.fixture.data.item("Samosa").unwrap().id;

    let (status, body) = harness
        .post(
            "/api/orders",
            "thor",
            json!({
                "restaurant_id": taj,
                "delivery_address": "Asgard",
                "items": [{ "menu_item_id": samosa, "quantity": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let harness = Harness::new().await;
    let burger_palace = harness.fixture.data.restaurant("Burger Palace").unwrap().id;
    let fries = harness.fixture.data.item("French Fries").unwrap().id;

    let (status, order) = harness
        .post(
            "/api/orders",
            "captain_america",
            json!({
                "restaurant_id": burger_palace,
                "delivery_address": "Avengers Tower",
                "items": [{ "menu_item_id": fries, "quantity": 3 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total_amount"], "14.97");
    let id = order["id"].as_str().unwrap().to_string();

    let (status, placed) = harness
        .post(&format!("/api/orders/{id}/place"), "captain_america", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(placed["status"], "CONFIRMED");

    let (status, body) = harness
        .post(&format!("/api/orders/{id}/place"), "captain_america", json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_transition");

    let (status, body) = harness
        .post(
            &format!("/api/orders/{id}/status"),
            "captain_america",
            json!({ "status": "DELIVERED" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_transition");

    let (status, body) = harness
        .post(
            &format!("/api/orders/{id}/status"),
            "captain_america",
            json!({ "status": "PREPARING" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PREPARING");

    // Indian manager cannot see the American order at all.
    let (status, body) = harness.get(&format!("/api/orders/{id}"), "captain_marvel").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn test_cancel_delivered_order_over_http() {
    let harness = Harness::new().await;
    let delivered = harness.fixture.data.orders[0].id;
    let uri = format!("/api/orders/{delivered}/cancel");

    let (status, _) = harness.post(&uri, "captain_marvel", json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = harness.post(&uri, "captain_america", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_payloads_are_unprocessable() {
    let harness = Harness::new().await;

    let (status, body) = harness
        .post(
            "/api/payment-methods",
            "travis",
            json!({ "payment_type": "CREDIT_CARD", "card_last4": "12" , "card_brand": "Visa" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "validation_failed");

    let (status, method) = harness
        .post(
            "/api/payment-methods",
            "travis",
            json!({ "payment_type": "UPI", "upi_id": "travis@upi", "is_default": true }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(method["is_default"], true);

    let (status, mine) = harness.get("/api/payment-methods/mine", "travis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_sets_default_for_another_user() {
    let harness = Harness::new().await;
    let manager_method = harness
        .fixture
        .data
        .payment_methods
        .iter()
        .find(|m| Some(m.user_id) == harness.fixture.data.user("captain_marvel").map(|u| u.id))
        .unwrap()
        .id;

    let (status, body) = harness
        .post(
            &format!("/api/payment-methods/{manager_method}/default"),
            "nick_fury",
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_default"], true);

    let (status, _) = harness
        .post(&format!("/api/payment-methods/{manager_method}/default"), "thor", json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_ordered_item_conflicts() {
    let harness = Harness::new().await;
    let samosa = harness.fixture.data.item("Samosa").unwrap().id;
    let token = harness.token("nick_fury");

    let (status, body) = harness
        .call(Method::DELETE, &format!("/api/menu-items/{samosa}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let spice_garden = harness.fixture.data.restaurant("Spice Garden").unwrap().id;
    let (status, body) = harness
        .call(Method::DELETE, &format!("/api/restaurants/{spice_garden}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_menu_endpoint_groups_items() {
    let harness = Harness::new().await;
    let taj = harness.fixture.data.restaurant("Taj Mahal Restaurant").unwrap().id;

    let (status, body) = harness.get(&format!("/api/restaurants/{taj}/menu"), "thanos").await;
    assert_eq!(status, StatusCode::OK);
    let sections = body.as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["category"]["name"], "Appetizers");
    assert_eq!(sections[1]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_order_items_endpoint_is_scoped() {
    let harness = Harness::new().await;

    let (status, body) = harness.get("/api/order-items", "thanos").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = harness.get("/api/order-items", "thor").await;
    assert!(body.as_array().unwrap().is_empty());
}

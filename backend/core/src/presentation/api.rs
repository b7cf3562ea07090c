// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! axum router over the application services. Handlers only translate HTTP
//! into service calls: every authorization decision happens in the services,
//! which receive the [`Actor`] resolved by the [`CurrentActor`] extractor.
//!
//! A request without an `Authorization` header runs as the anonymous actor
//! and is rejected by the policy layer with 401; a header that is present but
//! invalid is rejected here, before any handler runs. Registration, login and
//! token verification are the only routes that read credentials from the body.

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};
use uuid::Uuid;

use crate::application::auth::{AuthService, Login, Registration, StandardAuthService};
use crate::application::catalog::{
    MenuCategoryUpdate, MenuItemUpdate, NewMenuCategory, NewMenuItem, NewRestaurant, RestaurantUpdate,
};
use crate::application::error::ServiceError;
use crate::application::order::{CreateOrder, OrderUpdate};
use crate::application::payment::{NewPaymentMethod, PaymentMethodUpdate};
use crate::application::services::Services;
use crate::application::user::{NewUser, UserUpdate};
use crate::domain::actor::Actor;
use crate::domain::catalog::{MenuCategoryFilter, MenuItemFilter, RestaurantFilter};
use crate::domain::identity::{Credentials, IdentityError, IdentityProvider};
use crate::domain::ids::{MenuCategoryId, MenuItemId, OrderId, PaymentMethodId, RestaurantId, UserId};
use crate::domain::order::{OrderFilter, OrderStatus};
use crate::domain::policy::DecisionReason;
use crate::domain::repository::RepositoryError;

pub struct AppState {
    pub services: Services,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth: Arc<dyn AuthService>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(services: Services, identity: Arc<dyn IdentityProvider>) -> Self {
        let auth = Arc::new(StandardAuthService::new(
            services.repositories.users.clone(),
            identity.clone(),
        ));
        Self {
            services,
            identity,
            auth,
            start_time: Instant::now(),
        }
    }
}

type SharedState = Arc<AppState>;
type ApiResult<T> = Result<T, ApiError>;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/me", get(me))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/token", post(login))
        .route("/api/token/verify", post(verify_token))
        .route("/api/users/{id}", get(get_user).patch(update_user).delete(delete_user))
        .route("/api/restaurants", get(list_restaurants).post(create_restaurant))
        .route(
            "/api/restaurants/{id}",
            get(get_restaurant).patch(update_restaurant).delete(delete_restaurant),
        )
        .route("/api/restaurants/{id}/menu", get(restaurant_menu))
        .route("/api/menu-categories", get(list_categories).post(create_category))
        .route(
            "/api/menu-categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
        .route("/api/menu-items", get(list_menu_items).post(create_menu_item))
        .route(
            "/api/menu-items/{id}",
            get(get_menu_item).patch(update_menu_item).delete(delete_menu_item),
        )
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/mine", get(my_orders))
        .route("/api/orders/{id}", get(get_order).patch(update_order).delete(delete_order))
        .route("/api/orders/{id}/place", post(place_order))
        .route("/api/orders/{id}/cancel", post(cancel_order))
        .route("/api/orders/{id}/status", post(update_order_status))
        .route("/api/order-items", get(list_order_items))
        .route("/api/payment-methods", get(list_payment_methods).post(create_payment_method))
        .route("/api/payment-methods/mine", get(my_payment_methods))
        .route(
            "/api/payment-methods/{id}",
            get(get_payment_method)
                .patch(update_payment_method)
                .delete(delete_payment_method),
        )
        .route("/api/payment-methods/{id}/default", post(set_default_payment_method))
        .with_state(Arc::new(state))
}

// ============================================================================
// Actor extraction
// ============================================================================

/// The actor a request runs as.
pub struct CurrentActor(pub Actor);

impl FromRequestParts<SharedState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(CurrentActor(Actor::anonymous()));
        };
        let credentials = header
            .to_str()
            .ok()
            .and_then(Credentials::from_authorization_header)
            .ok_or(ApiError::Identity(IdentityError::InvalidToken(
                "malformed Authorization header".to_string(),
            )))?;

        let actor = state
            .identity
            .authenticate(&credentials)
            .await
            .map_err(ApiError::Identity)?;
        Ok(CurrentActor(actor))
    }
}

// ============================================================================
// Error mapping
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Identity(IdentityError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Identity(err) => identity_status(err),
            ApiError::Service(err) => match err {
                ServiceError::Identity(err) => identity_status(err),
                ServiceError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
                ServiceError::Forbidden {
                    reason: DecisionReason::OutOfScope,
                    ..
                } => (StatusCode::FORBIDDEN, "out_of_scope"),
                ServiceError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
                ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::InvalidTransition { .. } => (StatusCode::CONFLICT, "invalid_transition"),
                ServiceError::ValidationFailed(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
                ServiceError::Repository(RepositoryError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::Repository(RepositoryError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),
                ServiceError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
        }
    }
}

fn identity_status(err: &IdentityError) -> (StatusCode, &'static str) {
    match err {
        IdentityError::Repository(_) | IdentityError::PasswordHash(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
        IdentityError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
        _ => (StatusCode::UNAUTHORIZED, "unauthenticated"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            ApiError::Service(err) => err.to_string(),
            ApiError::Identity(err) => err.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        } else {
            debug!("Request rejected ({}): {}", status, message);
        }
        // Storage details stay in the log.
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            message
        };
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_handler(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

// -- authentication --

async fn register(State(state): State<SharedState>, Json(input): Json<Registration>) -> ApiResult<Response> {
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)).into_response())
}

async fn login(State(state): State<SharedState>, Json(input): Json<Login>) -> ApiResult<Response> {
    Ok(Json(state.auth.login(input).await?).into_response())
}

#[derive(Deserialize)]
struct TokenToVerify {
    token: String,
}

async fn verify_token(State(state): State<SharedState>, Json(body): Json<TokenToVerify>) -> ApiResult<Response> {
    let actor = state
        .identity
        .authenticate(&Credentials::Bearer(body.token))
        .await
        .map_err(ApiError::Identity)?;
    Ok(Json(json!({
        "user_id": actor.id().to_string(),
        "username": actor.username(),
        "role": actor.role().as_str(),
    }))
    .into_response())
}

// -- users --

async fn list_users(State(state): State<SharedState>, CurrentActor(actor): CurrentActor) -> ApiResult<Response> {
    let users = state.services.users.list_users(&actor).await?;
    Ok(Json(users).into_response())
}

async fn me(State(state): State<SharedState>, CurrentActor(actor): CurrentActor) -> ApiResult<Response> {
    Ok(Json(state.services.users.me(&actor).await?).into_response())
}

async fn get_user(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.users.get_user(&actor, UserId(id)).await?).into_response())
}

async fn create_user(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewUser>,
) -> ApiResult<Response> {
    let user = state.services.users.create_user(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

async fn update_user(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Response> {
    Ok(Json(state.services.users.update_user(&actor, UserId(id), update).await?).into_response())
}

async fn delete_user(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.users.delete_user(&actor, UserId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- restaurants --

async fn list_restaurants(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<RestaurantFilter>,
) -> ApiResult<Response> {
    Ok(Json(state.services.catalog.list_restaurants(&actor, filter).await?).into_response())
}

async fn get_restaurant(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.catalog.get_restaurant(&actor, RestaurantId(id)).await?).into_response())
}

async fn create_restaurant(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewRestaurant>,
) -> ApiResult<Response> {
    let restaurant = state.services.catalog.create_restaurant(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(restaurant)).into_response())
}

async fn update_restaurant(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<RestaurantUpdate>,
) -> ApiResult<Response> {
    let restaurant = state
        .services
        .catalog
        .update_restaurant(&actor, RestaurantId(id), update)
        .await?;
    Ok(Json(restaurant).into_response())
}

async fn delete_restaurant(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.catalog.delete_restaurant(&actor, RestaurantId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn restaurant_menu(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.catalog.restaurant_menu(&actor, RestaurantId(id)).await?).into_response())
}

// -- menu categories --

async fn list_categories(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<MenuCategoryFilter>,
) -> ApiResult<Response> {
    let categories = state.services.catalog.list_categories(&actor, filter).await?;
    Ok(Json(categories).into_response())
}

async fn get_category(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.catalog.get_category(&actor, MenuCategoryId(id)).await?).into_response())
}

async fn create_category(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewMenuCategory>,
) -> ApiResult<Response> {
    let category = state.services.catalog.create_category(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

async fn update_category(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<MenuCategoryUpdate>,
) -> ApiResult<Response> {
    let category = state
        .services
        .catalog
        .update_category(&actor, MenuCategoryId(id), update)
        .await?;
    Ok(Json(category).into_response())
}

async fn delete_category(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.catalog.delete_category(&actor, MenuCategoryId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- menu items --

async fn list_menu_items(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<MenuItemFilter>,
) -> ApiResult<Response> {
    let items = state.services.catalog.list_menu_items(&actor, filter).await?;
    Ok(Json(items).into_response())
}

async fn get_menu_item(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.catalog.get_menu_item(&actor, MenuItemId(id)).await?).into_response())
}

async fn create_menu_item(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewMenuItem>,
) -> ApiResult<Response> {
    let item = state.services.catalog.create_menu_item(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(item)).into_response())
}

async fn update_menu_item(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<MenuItemUpdate>,
) -> ApiResult<Response> {
    let item = state
        .services
        .catalog
        .update_menu_item(&actor, MenuItemId(id), update)
        .await?;
    Ok(Json(item).into_response())
}

async fn delete_menu_item(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.catalog.delete_menu_item(&actor, MenuItemId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

// -- orders --

#[derive(Debug, Deserialize)]
struct StatusChange {
    status: OrderStatus,
}

async fn list_orders(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.list_orders(&actor, filter).await?).into_response())
}

async fn my_orders(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.my_orders(&actor, filter).await?).into_response())
}

async fn get_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.get_order(&actor, OrderId(id)).await?).into_response())
}

async fn create_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateOrder>,
) -> ApiResult<Response> {
    let order = state.services.orders.create_order(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(order)).into_response())
}

async fn update_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<OrderUpdate>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.update_order(&actor, OrderId(id), update).await?).into_response())
}

async fn delete_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.orders.delete_order(&actor, OrderId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn place_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.place_order(&actor, OrderId(id)).await?).into_response())
}

async fn cancel_order(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.cancel_order(&actor, OrderId(id)).await?).into_response())
}

async fn update_order_status(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Response> {
    let order = state
        .services
        .orders
        .update_order_status(&actor, OrderId(id), change.status)
        .await?;
    Ok(Json(order).into_response())
}

async fn list_order_items(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Response> {
    Ok(Json(state.services.orders.list_order_items(&actor).await?).into_response())
}

// -- payment methods --

async fn list_payment_methods(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Response> {
    Ok(Json(state.services.payments.list_payment_methods(&actor).await?).into_response())
}

async fn my_payment_methods(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Response> {
    Ok(Json(state.services.payments.my_payment_methods(&actor).await?).into_response())
}

async fn get_payment_method(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let method = state
        .services
        .payments
        .get_payment_method(&actor, PaymentMethodId(id))
        .await?;
    Ok(Json(method).into_response())
}

async fn create_payment_method(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Json(input): Json<NewPaymentMethod>,
) -> ApiResult<Response> {
    let method = state.services.payments.create_payment_method(&actor, input).await?;
    Ok((StatusCode::CREATED, Json(method)).into_response())
}

async fn update_payment_method(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(update): Json<PaymentMethodUpdate>,
) -> ApiResult<Response> {
    let method = state
        .services
        .payments
        .update_payment_method(&actor, PaymentMethodId(id), update)
        .await?;
    Ok(Json(method).into_response())
}

async fn delete_payment_method(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .services
        .payments
        .delete_payment_method(&actor, PaymentMethodId(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_default_payment_method(
    State(state): State<SharedState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let method = state
        .services
        .payments
        .set_default_payment_method(&actor, PaymentMethodId(id))
        .await?;
    Ok(Json(method).into_response())
}

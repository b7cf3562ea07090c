// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Payment Method Service
//!
//! Payment methods are owner-scoped for every non-admin role. The "one
//! default per owner" rule is enforced by the repository in a single
//! isolation unit; this service only decides who may ask for it.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::policy::PolicyService;
use crate::domain::actor::Actor;
use crate::domain::events::PaymentEvent;
use crate::domain::ids::PaymentMethodId;
use crate::domain::payment::{PaymentMethod, PaymentType};
use crate::domain::policy::{Action, RecordRef};
use crate::domain::repository::PaymentMethodRepository;
use crate::domain::resource::{NoRelations, Predicate, ResourceKind};
use crate::infrastructure::event_bus::EventBus;

/// The owner is always the calling actor.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPaymentMethod {
    pub payment_type: PaymentType,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub card_last4: Option<String>,
    #[serde(default)]
    pub card_brand: Option<String>,
    #[serde(default)]
    pub upi_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentMethodUpdate {
    pub payment_type: Option<PaymentType>,
    pub is_default: Option<bool>,
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub upi_id: Option<String>,
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn list_payment_methods(&self, actor: &Actor) -> Result<Vec<PaymentMethod>, ServiceError>;
    async fn my_payment_methods(&self, actor: &Actor) -> Result<Vec<PaymentMethod>, ServiceError>;
    async fn get_payment_method(&self, actor: &Actor, id: PaymentMethodId) -> Result<PaymentMethod, ServiceError>;
    async fn create_payment_method(
        &self,
        actor: &Actor,
        input: NewPaymentMethod,
    ) -> Result<PaymentMethod, ServiceError>;
    async fn update_payment_method(
        &self,
        actor: &Actor,
        id: PaymentMethodId,
        update: PaymentMethodUpdate,
    ) -> Result<PaymentMethod, ServiceError>;
    async fn delete_payment_method(&self, actor: &Actor, id: PaymentMethodId) -> Result<(), ServiceError>;
    async fn set_default_payment_method(
        &self,
        actor: &Actor,
        id: PaymentMethodId,
    ) -> Result<PaymentMethod, ServiceError>;
}

pub struct StandardPaymentService {
    payments: Arc<dyn PaymentMethodRepository>,
    policy: PolicyService,
    event_bus: EventBus,
}

impl StandardPaymentService {
    pub fn new(payments: Arc<dyn PaymentMethodRepository>, policy: PolicyService, event_bus: EventBus) -> Self {
        Self {
            payments,
            policy,
            event_bus,
        }
    }

    async fn load(&self, actor: &Actor, action: Action, id: PaymentMethodId) -> Result<PaymentMethod, ServiceError> {
        let kind = ResourceKind::PaymentMethod;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let method = self
            .payments
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&method, &NoRelations)))?;
        Ok(method)
    }
}

#[async_trait]
impl PaymentService for StandardPaymentService {
    async fn list_payment_methods(&self, actor: &Actor) -> Result<Vec<PaymentMethod>, ServiceError> {
        let kind = ResourceKind::PaymentMethod;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.payments.list(&scope).await?)
    }

    async fn my_payment_methods(&self, actor: &Actor) -> Result<Vec<PaymentMethod>, ServiceError> {
        let kind = ResourceKind::PaymentMethod;
        self.policy.require(actor, Action::List, kind, None)?;
        let own = Predicate::owned_by(kind, "user_id", actor.id());
        Ok(self.payments.list(&own).await?)
    }

    async fn get_payment_method(&self, actor: &Actor, id: PaymentMethodId) -> Result<PaymentMethod, ServiceError> {
        self.load(actor, Action::Retrieve, id).await
    }

    async fn create_payment_method(
        &self,
        actor: &Actor,
        input: NewPaymentMethod,
    ) -> Result<PaymentMethod, ServiceError> {
        let kind = ResourceKind::PaymentMethod;
        self.policy.require(actor, Action::Create, kind, None)?;

        let mut method = PaymentMethod::new(actor.id(), input.payment_type);
        method.is_default = input.is_default;
        method.card_last4 = input.card_last4;
        method.card_brand = input.card_brand;
        method.upi_id = input.upi_id;
        method.validate()?;

        self.payments.create(&method).await?;
        info!(
            "Payment method {} ({}) added for {}",
            method.id,
            method.payment_type,
            actor.username()
        );
        self.event_bus.publish_payment_event(PaymentEvent::PaymentMethodAdded {
            payment_method_id: method.id,
            user_id: method.user_id,
            is_default: method.is_default,
            added_at: method.created_at,
        });
        Ok(method)
    }

    async fn update_payment_method(
        &self,
        actor: &Actor,
        id: PaymentMethodId,
        update: PaymentMethodUpdate,
    ) -> Result<PaymentMethod, ServiceError> {
        let mut method = self.load(actor, Action::Update, id).await?;

        if let Some(payment_type) = update.payment_type {
            method.payment_type = payment_type;
        }
        if let Some(is_default) = update.is_default {
            method.is_default = is_default;
        }
        if let Some(card_last4) = update.card_last4 {
            method.card_last4 = Some(card_last4);
        }
        if let Some(card_brand) = update.card_brand {
            method.card_brand = Some(card_brand);
        }
        if let Some(upi_id) = update.upi_id {
            method.upi_id = Some(upi_id);
        }
        method.validate()?;
        method.updated_at = Utc::now();

        self.payments.save(&method).await?;
        Ok(method)
    }

    async fn delete_payment_method(&self, actor: &Actor, id: PaymentMethodId) -> Result<(), ServiceError> {
        let method = self.load(actor, Action::Delete, id).await?;
        self.payments.delete(method.id).await?;
        self.event_bus.publish_payment_event(PaymentEvent::PaymentMethodRemoved {
            payment_method_id: method.id,
            removed_by: actor.id(),
            removed_at: Utc::now(),
        });
        Ok(())
    }

    async fn set_default_payment_method(
        &self,
        actor: &Actor,
        id: PaymentMethodId,
    ) -> Result<PaymentMethod, ServiceError> {
        let method = self.load(actor, Action::SetDefault, id).await?;
        let updated = self.payments.set_default(method.id).await?;

        info!(
            "Payment method {} is now the default for user {} (set by {})",
            updated.id,
            updated.user_id,
            actor.username()
        );
        self.event_bus.publish_payment_event(PaymentEvent::DefaultPaymentMethodChanged {
            payment_method_id: updated.id,
            user_id: updated.user_id,
            changed_by: actor.id(),
            changed_at: Utc::now(),
        });
        Ok(updated)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Application Service
//!
//! Thin application-layer wrapper over the domain [`PolicyEngine`]. Every
//! service routes its authorization through here so that denials are logged
//! and published on the event bus in one place.
//!
//! ## Relationships
//! - Consumes `PolicyEngine` for decisions and scope predicates
//! - Publishes `PolicyEvent::AccessDenied` for role and scope denials

use chrono::Utc;
use tracing::{debug, warn};

use crate::application::error::ServiceError;
use crate::domain::actor::Actor;
use crate::domain::events::PolicyEvent;
use crate::domain::policy::{Action, DecisionReason, PolicyEngine, PolicyError, RecordRef};
use crate::domain::resource::{Predicate, ResourceKind};
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone)]
pub struct PolicyService {
    engine: PolicyEngine,
    event_bus: EventBus,
}

impl PolicyService {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            engine: PolicyEngine::new(),
            event_bus,
        }
    }

    pub fn engine(&self) -> &PolicyEngine {
        &self.engine
    }

    /// Authorize `action`; with a record, the record layer is checked as well.
    pub fn require(
        &self,
        actor: &Actor,
        action: Action,
        kind: ResourceKind,
        record: Option<RecordRef<'_>>,
    ) -> Result<(), ServiceError> {
        match self.engine.check(actor, action, kind, record) {
            Ok(()) => Ok(()),
            Err(PolicyError::Unauthenticated) => Err(ServiceError::Unauthenticated),
            Err(err) => {
                let reason = match err {
                    PolicyError::OutOfScope { .. } => DecisionReason::OutOfScope,
                    _ => DecisionReason::RoleDenied,
                };
                warn!(
                    actor = %actor.username(),
                    role = %actor.role(),
                    %action,
                    resource = %kind,
                    "Access denied: {}",
                    err
                );
                self.event_bus.publish_policy_event(PolicyEvent::AccessDenied {
                    actor_id: actor.id(),
                    role: actor.role(),
                    action,
                    resource: kind,
                    reason,
                    denied_at: Utc::now(),
                });
                Err(err.into())
            }
        }
    }

    /// Read predicate for `kind`.
    pub fn scope(&self, actor: &Actor, kind: ResourceKind) -> Predicate {
        let predicate = self.engine.scope_filter(actor, kind);
        debug!(actor = %actor.username(), resource = %kind, ?predicate, "Scope resolved");
        predicate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{Country, Role};
    use crate::domain::ids::UserId;
    use crate::infrastructure::event_bus::DomainEvent;

    #[tokio::test]
    async fn test_denial_is_published() {
        let event_bus = EventBus::new(8);
        let mut receiver = event_bus.subscribe();
        let policy = PolicyService::new(event_bus);
        let member = Actor::new(UserId::new(), "thor", Role::Member, Some(Country::India));

        let err = policy
            .require(&member, Action::CancelOrder, ResourceKind::Order, None)
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Forbidden {
                reason: DecisionReason::RoleDenied,
                ..
            }
        ));

        match receiver.recv().await.unwrap() {
            DomainEvent::Policy(PolicyEvent::AccessDenied { actor_id, action, .. }) => {
                assert_eq!(actor_id, member.id());
                assert_eq!(action, Action::CancelOrder);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_unauthenticated_is_not_published() {
        let event_bus = EventBus::new(8);
        let mut receiver = event_bus.subscribe();
        let policy = PolicyService::new(event_bus);

        let err = policy
            .require(&Actor::anonymous(), Action::List, ResourceKind::Restaurant, None)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated));
        assert!(receiver.try_recv().is_err());
    }
}

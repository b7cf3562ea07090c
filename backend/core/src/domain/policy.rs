// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Policy Engine
//!
//! Central authorization point consulted by every application service.
//!
//! A decision is made in two layers:
//!
//! 1. **Role layer**: may this role perform this action on this resource
//!    family at all? ([`PolicyEngine::role_permits`])
//! 2. **Record layer**: when a concrete record is supplied, does it satisfy
//!    the actor's scope predicate? This is evaluated even when the record was
//!    loaded through an already-scoped query.
//!
//! Read narrowing is delegated to the resource descriptor table
//! ([`PolicyEngine::scope_filter`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::actor::{Actor, Role};
use crate::domain::resource::{Predicate, RelationResolver, ResourceKind, Scoped};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
    PlaceOrder,
    CancelOrder,
    UpdateStatus,
    SetDefault,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::PlaceOrder => "place_order",
            Action::CancelOrder => "cancel_order",
            Action::UpdateStatus => "update_status",
            Action::SetDefault => "set_default",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Granted,
    Unauthenticated,
    /// The role may never perform the action on this resource family.
    RoleDenied,
    /// The role may perform the action, but not on this record.
    OutOfScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allow: bool,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn grant() -> Self {
        Self {
            allow: true,
            reason: DecisionReason::Granted,
        }
    }

    pub fn deny(reason: DecisionReason) -> Self {
        Self { allow: false, reason }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Role '{role}' may not {action} {kind}")]
    RoleDenied {
        role: Role,
        action: Action,
        kind: ResourceKind,
    },

    #[error("This {kind} is outside your scope for {action}")]
    OutOfScope { action: Action, kind: ResourceKind },
}

/// A concrete record offered to [`PolicyEngine::authorize`] together with the
/// resolver needed to evaluate indirect scopes on it.
#[derive(Clone, Copy)]
pub struct RecordRef<'a> {
    pub record: &'a dyn Scoped,
    pub resolver: &'a dyn RelationResolver,
}

impl<'a> RecordRef<'a> {
    pub fn new(record: &'a dyn Scoped, resolver: &'a dyn RelationResolver) -> Self {
        Self { record, resolver }
    }
}

/// Stateless; the rules live in the role table below and in the resource
/// descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Role-level permission table.
    pub fn role_permits(role: Role, action: Action, kind: ResourceKind) -> bool {
        use Action::*;
        use ResourceKind as K;

        if action.is_read() {
            return true;
        }

        match (kind, action) {
            (K::Restaurant | K::MenuCategory | K::MenuItem | K::User, Create | Update | Delete) => {
                role == Role::Admin
            }

            (K::Order, Create | PlaceOrder | CancelOrder | UpdateStatus) => {
                matches!(role, Role::Admin | Role::Manager)
            }
            (K::Order, Update | Delete) => role == Role::Admin,

            (K::PaymentMethod, Create | SetDefault) => true,
            (K::PaymentMethod, Update | Delete) => role == Role::Admin,

            // Order lines are only written through their order.
            _ => false,
        }
    }

    /// Read predicate narrowing `kind` to what `actor` may see.
    pub fn scope_filter(&self, actor: &Actor, kind: ResourceKind) -> Predicate {
        kind.descriptor().scope_filter(actor)
    }

    pub fn authorize(
        &self,
        actor: &Actor,
        action: Action,
        kind: ResourceKind,
        record: Option<RecordRef<'_>>,
    ) -> Decision {
        if !actor.is_authenticated() {
            return Decision::deny(DecisionReason::Unauthenticated);
        }
        if !Self::role_permits(actor.role(), action, kind) {
            return Decision::deny(DecisionReason::RoleDenied);
        }
        if let Some(record) = record {
            let predicate = self.scope_filter(actor, kind);
            if !predicate.matches(record.record, record.resolver) {
                return Decision::deny(DecisionReason::OutOfScope);
            }
        }
        Decision::grant()
    }

    /// [`authorize`](Self::authorize) folded into a `Result`.
    pub fn check(
        &self,
        actor: &Actor,
        action: Action,
        kind: ResourceKind,
        record: Option<RecordRef<'_>>,
    ) -> Result<(), PolicyError> {
        let decision = self.authorize(actor, action, kind, record);
        match decision.reason {
            DecisionReason::Granted => Ok(()),
            DecisionReason::Unauthenticated => Err(PolicyError::Unauthenticated),
            DecisionReason::RoleDenied => Err(PolicyError::RoleDenied {
                role: actor.role(),
                action,
                kind,
            }),
            DecisionReason::OutOfScope => Err(PolicyError::OutOfScope { action, kind }),
        }
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Error type shared by every application service.
//!
//! A record that exists but lies outside the actor's scope is reported as
//! [`ServiceError::NotFound`], the same as a record that does not exist.

use thiserror::Error;

use crate::domain::identity::IdentityError;
use crate::domain::order::{OrderError, OrderStatus};
use crate::domain::payment::PaymentError;
use crate::domain::policy::{DecisionReason, PolicyError};
use crate::domain::repository::RepositoryError;
use crate::domain::resource::ResourceKind;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {message}")]
    Forbidden { reason: DecisionReason, message: String },

    #[error("{kind} not found")]
    NotFound { kind: ResourceKind },

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn not_found(kind: ResourceKind) -> Self {
        ServiceError::NotFound { kind }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::ValidationFailed(message.into())
    }
}

impl From<PolicyError> for ServiceError {
    fn from(err: PolicyError) -> Self {
        let reason = match &err {
            PolicyError::Unauthenticated => return ServiceError::Unauthenticated,
            PolicyError::RoleDenied { .. } => DecisionReason::RoleDenied,
            PolicyError::OutOfScope { .. } => DecisionReason::OutOfScope,
        };
        ServiceError::Forbidden {
            reason,
            message: err.to_string(),
        }
    }
}

impl From<OrderError> for ServiceError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidTransition { from, to } => ServiceError::InvalidTransition { from, to },
            other => ServiceError::ValidationFailed(other.to_string()),
        }
    }
}

impl From<PaymentError> for ServiceError {
    fn from(err: PaymentError) -> Self {
        ServiceError::ValidationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Role;
    use crate::domain::policy::Action;

    #[test]
    fn test_policy_errors_keep_their_reason() {
        let err: ServiceError = PolicyError::RoleDenied {
            role: Role::Member,
            action: Action::Create,
            kind: ResourceKind::Order,
        }
        .into();
        assert!(matches!(
            err,
            ServiceError::Forbidden {
                reason: DecisionReason::RoleDenied,
                ..
            }
        ));

        let err: ServiceError = PolicyError::Unauthenticated.into();
        assert!(matches!(err, ServiceError::Unauthenticated));
    }

    #[test]
    fn test_order_errors_map_to_transition_or_validation() {
        let err: ServiceError = OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        }
        .into();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        let err: ServiceError = OrderError::EmptyOrder.into();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }
}

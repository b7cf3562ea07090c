// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Resource Descriptors
//!
//! Static, per-resource declaration of how a record is scoped for non-admin
//! actors. The table is resolved at compile time through an exhaustive match
//! on [`ResourceKind`]; adding a resource without declaring its scope is a
//! compile error.
//!
//! | Resource | manager / member | member override |
//! |----------|------------------|-----------------|
//! | `User` | `country` | self (`id`) |
//! | `Restaurant` | `country` | |
//! | `MenuCategory` | `restaurant → country` | |
//! | `MenuItem` | `category → restaurant → country` | |
//! | `Order` | `country` | owner (`user_id`) |
//! | `OrderItem` | `order → country` | `order → user_id` |
//! | `PaymentMethod` | owner (`user_id`) | |
//!
//! A [`ScopeStrategy`] turns into a [`Predicate`], a pure value that is either
//! evaluated in memory ([`Predicate::matches`]) or rendered into SQL by the
//! persistence layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::actor::{Actor, Country, Role};
use crate::domain::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Restaurant,
    MenuCategory,
    MenuItem,
    Order,
    OrderItem,
    PaymentMethod,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::User,
        ResourceKind::Restaurant,
        ResourceKind::MenuCategory,
        ResourceKind::MenuItem,
        ResourceKind::Order,
        ResourceKind::OrderItem,
        ResourceKind::PaymentMethod,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Restaurant => "restaurant",
            ResourceKind::MenuCategory => "menu_category",
            ResourceKind::MenuItem => "menu_item",
            ResourceKind::Order => "order",
            ResourceKind::OrderItem => "order_item",
            ResourceKind::PaymentMethod => "payment_method",
        }
    }

    /// Shared catalog data (restaurants and their menus).
    pub fn is_catalog(&self) -> bool {
        matches!(
            self,
            ResourceKind::Restaurant | ResourceKind::MenuCategory | ResourceKind::MenuItem
        )
    }

    pub fn descriptor(&self) -> &'static ResourceDescriptor {
        match self {
            ResourceKind::User => &USER,
            ResourceKind::Restaurant => &RESTAURANT,
            ResourceKind::MenuCategory => &MENU_CATEGORY,
            ResourceKind::MenuItem => &MENU_ITEM,
            ResourceKind::Order => &ORDER,
            ResourceKind::OrderItem => &ORDER_ITEM,
            ResourceKind::PaymentMethod => &PAYMENT_METHOD,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scoping attribute value read off a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrValue {
    Country(Country),
    Id(Uuid),
}

/// One hop of an indirect scope: follow `foreign_key` on the current record to
/// a record of kind `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub name: &'static str,
    pub target: ResourceKind,
    pub foreign_key: &'static str,
}

pub const CATEGORY_TO_RESTAURANT: Relation = Relation {
    name: "restaurant",
    target: ResourceKind::Restaurant,
    foreign_key: "restaurant_id",
};

pub const ITEM_TO_CATEGORY: Relation = Relation {
    name: "category",
    target: ResourceKind::MenuCategory,
    foreign_key: "category_id",
};

pub const ORDER_ITEM_TO_ORDER: Relation = Relation {
    name: "order",
    target: ResourceKind::Order,
    foreign_key: "order_id",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeStrategy {
    /// `record.field == actor.country`
    DirectCountry { field: &'static str },
    /// Traverse `path`, then compare `field` on the last record with the actor's country
    IndirectCountry {
        path: &'static [Relation],
        field: &'static str,
    },
    /// `record.field == actor.id`
    OwnerScoped { field: &'static str },
    /// Traverse `path`, then compare `field` on the last record with the actor's id
    IndirectOwner {
        path: &'static [Relation],
        field: &'static str,
    },
    /// Explicitly shared with every authenticated actor.
    Unscoped,
}

#[derive(Debug)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub scope: ScopeStrategy,
    /// Narrower strategy applied to members instead of `scope`.
    pub member_scope: Option<ScopeStrategy>,
}

static USER: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::User,
    scope: ScopeStrategy::DirectCountry { field: "country" },
    member_scope: Some(ScopeStrategy::OwnerScoped { field: "id" }),
};

static RESTAURANT: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Restaurant,
    scope: ScopeStrategy::DirectCountry { field: "country" },
    member_scope: None,
};

static MENU_CATEGORY: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::MenuCategory,
    scope: ScopeStrategy::IndirectCountry {
        path: &[CATEGORY_TO_RESTAURANT],
        field: "country",
    },
    member_scope: None,
};

static MENU_ITEM: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::MenuItem,
    scope: ScopeStrategy::IndirectCountry {
        path: &[ITEM_TO_CATEGORY, CATEGORY_TO_RESTAURANT],
        field: "country",
    },
    member_scope: None,
};

static ORDER: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::Order,
    scope: ScopeStrategy::DirectCountry { field: "country" },
    member_scope: Some(ScopeStrategy::OwnerScoped { field: "user_id" }),
};

static ORDER_ITEM: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::OrderItem,
    scope: ScopeStrategy::IndirectCountry {
        path: &[ORDER_ITEM_TO_ORDER],
        field: "country",
    },
    member_scope: Some(ScopeStrategy::IndirectOwner {
        path: &[ORDER_ITEM_TO_ORDER],
        field: "user_id",
    }),
};

static PAYMENT_METHOD: ResourceDescriptor = ResourceDescriptor {
    kind: ResourceKind::PaymentMethod,
    scope: ScopeStrategy::OwnerScoped { field: "user_id" },
    member_scope: None,
};

impl ResourceDescriptor {
    /// Strategy that applies to `role`, or `None` when the role is not narrowed.
    pub fn strategy_for(&self, role: Role) -> Option<&ScopeStrategy> {
        match role {
            Role::Admin => None,
            Role::Manager => Some(&self.scope),
            Role::Member => Some(self.member_scope.as_ref().unwrap_or(&self.scope)),
        }
    }

    /// Build the read predicate for `actor`.
    pub fn scope_filter(&self, actor: &Actor) -> Predicate {
        if !actor.is_authenticated() {
            return Predicate::Nothing;
        }
        let Some(strategy) = self.strategy_for(actor.role()) else {
            return Predicate::All;
        };

        match *strategy {
            ScopeStrategy::DirectCountry { field } => match actor.country() {
                Some(country) => Predicate::Equals {
                    kind: self.kind,
                    path: &[],
                    field,
                    value: AttrValue::Country(country),
                },
                None => Predicate::Nothing,
            },
            ScopeStrategy::IndirectCountry { path, field } => match actor.country() {
                Some(country) => Predicate::Equals {
                    kind: self.kind,
                    path,
                    field,
                    value: AttrValue::Country(country),
                },
                None => Predicate::Nothing,
            },
            ScopeStrategy::OwnerScoped { field } => Predicate::Equals {
                kind: self.kind,
                path: &[],
                field,
                value: AttrValue::Id(actor.id().as_uuid()),
            },
            ScopeStrategy::IndirectOwner { path, field } => Predicate::Equals {
                kind: self.kind,
                path,
                field,
                value: AttrValue::Id(actor.id().as_uuid()),
            },
            ScopeStrategy::Unscoped => {
                tracing::debug!("{} is declared unscoped; no narrowing for {}", self.kind, actor.role());
                Predicate::All
            }
        }
    }
}

/// Read access to a record's scoping attributes.
pub trait Scoped {
    fn attribute(&self, field: &str) -> Option<AttrValue>;
}

/// Looks up related records while an indirect predicate is being evaluated.
pub trait RelationResolver {
    fn resolve(&self, target: ResourceKind, id: Uuid) -> Option<Box<dyn Scoped>>;
}

/// Resolver for contexts where only direct attributes are available. Indirect
/// predicates evaluated against it never match.
pub struct NoRelations;

impl RelationResolver for NoRelations {
    fn resolve(&self, _target: ResourceKind, _id: Uuid) -> Option<Box<dyn Scoped>> {
        None
    }
}

/// Row-level filter produced by [`ResourceDescriptor::scope_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    All,
    Nothing,
    Equals {
        kind: ResourceKind,
        path: &'static [Relation],
        field: &'static str,
        value: AttrValue,
    },
}

impl Predicate {
    /// `record.field == owner`, regardless of the actor's role.
    pub fn owned_by(kind: ResourceKind, field: &'static str, owner: UserId) -> Self {
        Predicate::Equals {
            kind,
            path: &[],
            field,
            value: AttrValue::Id(owner.as_uuid()),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Predicate::All)
    }

    pub fn matches(&self, record: &dyn Scoped, resolver: &dyn RelationResolver) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Nothing => false,
            Predicate::Equals { path, field, value, .. } => {
                let mut hop: Option<Box<dyn Scoped>> = None;
                for relation in path.iter() {
                    let current: &dyn Scoped = match &hop {
                        Some(next) => next.as_ref(),
                        None => record,
                    };
                    let Some(AttrValue::Id(id)) = current.attribute(relation.foreign_key) else {
                        return false;
                    };
                    match resolver.resolve(relation.target, id) {
                        Some(next) => hop = Some(next),
                        None => return false,
                    }
                }
                let current: &dyn Scoped = match &hop {
                    Some(next) => next.as_ref(),
                    None => record,
                };
                current.attribute(field) == Some(*value)
            }
        }
    }

    /// Keep only the records of `records` this predicate admits.
    pub fn filter<T: Scoped + Clone>(&self, records: &[T], resolver: &dyn RelationResolver) -> Vec<T> {
        records
            .iter()
            .filter(|record| self.matches(*record, resolver))
            .cloned()
            .collect()
    }
}

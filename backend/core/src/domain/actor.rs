// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Actor Model
//!
//! The authenticated principal every policy and service call receives
//! explicitly. An [`Actor`] is an immutable value: its role and country are
//! fixed for the lifetime of a request and can only change through the user
//! management service, never from a request payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::ids::UserId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActorError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown country: {0}")]
    UnknownCountry(String),
}

/// Role granted to a user. Roles are not hierarchical flags; every policy
/// rule names the roles it admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ActorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "member" => Ok(Role::Member),
            other => Err(ActorError::UnknownRole(other.to_string())),
        }
    }
}

/// Tenant boundary. Country-scoped data is only visible to non-admin actors
/// of the same country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    India,
    America,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::India => "INDIA",
            Country::America => "AMERICA",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Country {
    type Err = ActorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INDIA" => Ok(Country::India),
            "AMERICA" => Ok(Country::America),
            other => Err(ActorError::UnknownCountry(other.to_string())),
        }
    }
}

/// Authenticated principal passed into every policy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    id: UserId,
    username: String,
    role: Role,
    country: Option<Country>,
    authenticated: bool,
}

impl Actor {
    /// Build a verified actor. Only identity providers and tests should call this.
    pub fn new(id: UserId, username: impl Into<String>, role: Role, country: Option<Country>) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            country,
            authenticated: true,
        }
    }

    /// The principal used when a request carries no credentials. Every policy
    /// decision for it is `Unauthenticated`.
    pub fn anonymous() -> Self {
        Self {
            id: UserId(uuid::Uuid::nil()),
            username: String::new(),
            role: Role::Member,
            country: None,
            authenticated: false,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn country(&self) -> Option<Country> {
        self.country
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_admin(&self) -> bool {
        self.authenticated && self.role == Role::Admin
    }
}

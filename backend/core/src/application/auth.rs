// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Authentication Service
//!
//! Self-service registration and password login. Both end by issuing an
//! access token; every other request authenticates with that bearer token.
//! Registration always creates a member, and only an admin can change the
//! role afterwards.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::domain::actor::{Country, Role};
use crate::domain::identity::{check_new_password, Credentials, IdentityError, IdentityProvider};
use crate::domain::repository::UserRepository;
use crate::domain::user::User;

#[derive(Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
    pub country: Country,
}

#[derive(Clone, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

/// An account together with a freshly issued access token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub access: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, input: Registration) -> Result<Session, ServiceError>;
    async fn login(&self, input: Login) -> Result<Session, ServiceError>;
}

pub struct StandardAuthService {
    users: Arc<dyn UserRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl StandardAuthService {
    pub fn new(users: Arc<dyn UserRepository>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { users, identity }
    }

    fn session(&self, user: User) -> Result<Session, ServiceError> {
        let access = self.identity.issue_token(&user)?;
        Ok(Session { user, access })
    }
}

#[async_trait]
impl AuthService for StandardAuthService {
    async fn register(&self, input: Registration) -> Result<Session, ServiceError> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(ServiceError::invalid("username is required"));
        }
        check_new_password(&input.password).map_err(ServiceError::invalid)?;
        if self.users.find_by_username(username).await?.is_some() {
            return Err(ServiceError::invalid(format!("username '{username}' is already taken")));
        }

        let mut user = User::new(username, input.email.trim(), Role::Member, Some(input.country));
        user.password_hash = Some(self.identity.hash_password(&input.password).await?);
        self.users.save(&user).await?;
        info!("User {} registered as member in {}", user.username, input.country);

        self.session(user)
    }

    async fn login(&self, input: Login) -> Result<Session, ServiceError> {
        let actor = self
            .identity
            .authenticate(&Credentials::Password {
                username: input.username,
                password: input.password,
            })
            .await?;
        let user = self
            .users
            .find_by_id(actor.id())
            .await?
            .ok_or(IdentityError::UnknownUser)?;
        info!("User {} logged in", user.username);
        self.session(user)
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # User Service
//!
//! Accounts are readable within scope (managers see their country, members
//! see themselves). Role and country only change through an admin update.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::application::error::ServiceError;
use crate::application::policy::PolicyService;
use crate::domain::actor::{Actor, Country, Role};
use crate::domain::ids::UserId;
use crate::domain::policy::{Action, RecordRef};
use crate::domain::repository::UserRepository;
use crate::domain::resource::{NoRelations, ResourceKind};
use crate::domain::user::User;

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    pub country: Country,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub role: Option<Role>,
    pub country: Option<Country>,
    pub is_active: Option<bool>,
}

#[async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, ServiceError>;
    async fn get_user(&self, actor: &Actor, id: UserId) -> Result<User, ServiceError>;
    /// The account the actor authenticated as.
    async fn me(&self, actor: &Actor) -> Result<User, ServiceError>;
    async fn create_user(&self, actor: &Actor, input: NewUser) -> Result<User, ServiceError>;
    async fn update_user(&self, actor: &Actor, id: UserId, update: UserUpdate) -> Result<User, ServiceError>;
    async fn delete_user(&self, actor: &Actor, id: UserId) -> Result<(), ServiceError>;
}

pub struct StandardUserService {
    users: Arc<dyn UserRepository>,
    policy: PolicyService,
}

impl StandardUserService {
    pub fn new(users: Arc<dyn UserRepository>, policy: PolicyService) -> Self {
        Self { users, policy }
    }

    async fn load(&self, actor: &Actor, action: Action, id: UserId) -> Result<User, ServiceError> {
        let kind = ResourceKind::User;
        self.policy.require(actor, action, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        let user = self
            .users
            .find_in_scope(id, &scope)
            .await?
            .ok_or(ServiceError::not_found(kind))?;
        self.policy
            .require(actor, action, kind, Some(RecordRef::new(&user, &NoRelations)))?;
        Ok(user)
    }
}

#[async_trait]
impl UserService for StandardUserService {
    async fn list_users(&self, actor: &Actor) -> Result<Vec<User>, ServiceError> {
        let kind = ResourceKind::User;
        self.policy.require(actor, Action::List, kind, None)?;
        let scope = self.policy.scope(actor, kind);
        Ok(self.users.list(&scope).await?)
    }

    async fn get_user(&self, actor: &Actor, id: UserId) -> Result<User, ServiceError> {
        self.load(actor, Action::Retrieve, id).await
    }

    async fn me(&self, actor: &Actor) -> Result<User, ServiceError> {
        if !actor.is_authenticated() {
            return Err(ServiceError::Unauthenticated);
        }
        self.users
            .find_by_id(actor.id())
            .await?
            .ok_or(ServiceError::not_found(ResourceKind::User))
    }

    async fn create_user(&self, actor: &Actor, input: NewUser) -> Result<User, ServiceError> {
        self.policy.require(actor, Action::Create, ResourceKind::User, None)?;

        let username = input.username.trim();
        if username.is_empty() {
            return Err(ServiceError::invalid("username is required"));
        }
        if self.users.find_by_username(username).await?.is_some() {
            return Err(ServiceError::invalid(format!("username '{username}' is already taken")));
        }

        let user = User::new(username, input.email, input.role, Some(input.country));
        self.users.save(&user).await?;
        info!("User {} ({} / {}) created by {}", user.username, user.role, input.country, actor.username());
        Ok(user)
    }

    async fn update_user(&self, actor: &Actor, id: UserId, update: UserUpdate) -> Result<User, ServiceError> {
        let mut user = self.load(actor, Action::Update, id).await?;

        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(role) = update.role {
            if role != user.role {
                info!("User {} role changed {} -> {} by {}", user.username, user.role, role, actor.username());
            }
            user.role = role;
        }
        if let Some(country) = update.country {
            user.country = Some(country);
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        self.users.save(&user).await?;
        Ok(user)
    }

    async fn delete_user(&self, actor: &Actor, id: UserId) -> Result<(), ServiceError> {
        let user = self.load(actor, Action::Delete, id).await?;
        if user.id == actor.id() {
            return Err(ServiceError::invalid("You cannot delete your own account"));
        }
        self.users.delete(user.id).await?;
        info!("User {} deleted by {}", user.username, actor.username());
        Ok(())
    }
}

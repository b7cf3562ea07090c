// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # JWT Identity Provider
//!
//! Verifies HS256 bearer tokens and resolves the subject against the user
//! repository. The role and country of the resulting [`Actor`] always come
//! from the stored account, never from token claims, so an admin changing a
//! user's role takes effect on that user's next request.
//!
//! Username and password credentials are checked against the account's
//! Argon2 hash; that path is only used to obtain a token.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::actor::Actor;
use crate::domain::identity::{Credentials, IdentityError, IdentityProvider};
use crate::domain::ids::UserId;
use crate::domain::repository::UserRepository;
use crate::domain::user::User;
use crate::infrastructure::password::{hash_password_blocking, verify_password_blocking, PasswordError};

pub const TOKEN_ISSUER: &str = "food-ordering";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    users: Arc<dyn UserRepository>,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str, token_ttl_minutes: i64, users: Arc<dyn UserRepository>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: Duration::minutes(token_ttl_minutes),
            users,
        }
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, IdentityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.set_issuer(&[TOKEN_ISSUER]);

        decode::<AccessClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::InvalidToken(e.to_string()),
            })
    }

    async fn user_for_token(&self, token: &str) -> Result<User, IdentityError> {
        let claims = self.verify(token)?;
        let id = UserId::from_string(&claims.sub)
            .map_err(|_| IdentityError::InvalidToken("subject is not a user id".to_string()))?;
        self.users.find_by_id(id).await?.ok_or(IdentityError::UnknownUser)
    }

    /// Unknown usernames, accounts without a password and wrong passwords all
    /// fail the same way.
    async fn user_for_password(&self, username: &str, password: &str) -> Result<User, IdentityError> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;
        let Some(stored) = user.password_hash.clone() else {
            return Err(IdentityError::InvalidCredentials);
        };
        if !verify_password_blocking(password.to_string(), stored)
            .await
            .map_err(password_failure)?
        {
            warn!("Rejected password login for {}", user.username);
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(user)
    }
}

fn password_failure(err: PasswordError) -> IdentityError {
    IdentityError::PasswordHash(err.to_string())
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Actor, IdentityError> {
        let user = match credentials {
            Credentials::Bearer(token) => self.user_for_token(token).await?,
            Credentials::Password { username, password } => self.user_for_password(username, password).await?,
        };
        if !user.is_active {
            return Err(IdentityError::InactiveUser);
        }
        debug!("Authenticated {} as {}", user.username, user.role);
        Ok(user.actor())
    }

    fn issue_token(&self, user: &User) -> Result<String, IdentityError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            country: user.country.map(|c| c.as_str().to_string()),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))
    }

    async fn hash_password(&self, password: &str) -> Result<String, IdentityError> {
        hash_password_blocking(password.to_string()).await.map_err(password_failure)
    }
}

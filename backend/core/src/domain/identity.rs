// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identity provider contract. Implementations turn presented credentials into
//! a verified [`Actor`]; the rest of the system never inspects credentials.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::domain::actor::Actor;
use crate::domain::repository::RepositoryError;
use crate::domain::user::User;

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Upper bound on what is ever fed to the password hash.
pub const MAX_PASSWORD_LENGTH: usize = 512;

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Password { username: String, password: String },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(..)"),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}

impl Credentials {
    /// Parse an `Authorization` header value.
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then(|| Credentials::Bearer(token.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    Expired,

    #[error("Unknown user")]
    UnknownUser,

    #[error("User is inactive")]
    InactiveUser,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Actor, IdentityError>;

    /// Sign an access token that `authenticate` will accept as a bearer credential.
    fn issue_token(&self, user: &User) -> Result<String, IdentityError>;

    /// Hash a new password into the form checked by `Credentials::Password`.
    async fn hash_password(&self, password: &str) -> Result<String, IdentityError>;
}

/// Length rules for a password chosen by a user.
pub fn check_new_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!("password must be at least {MIN_PASSWORD_LENGTH} characters"));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(format!("password must be at most {MAX_PASSWORD_LENGTH} bytes"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_header() {
        assert_eq!(
            Credentials::from_authorization_header("Bearer abc.def"),
            Some(Credentials::Bearer("abc.def".into()))
        );
        assert_eq!(
            Credentials::from_authorization_header("bearer   tok "),
            Some(Credentials::Bearer("tok".into()))
        );
        assert_eq!(Credentials::from_authorization_header("Basic dXNlcg=="), None);
        assert_eq!(Credentials::from_authorization_header("Bearer "), None);
    }

    #[test]
    fn test_password_stays_out_of_debug_output() {
        let credentials = Credentials::Password {
            username: "thor".into(),
            password: "mjolnir-2024".into(),
        };
        let printed = format!("{credentials:?}");
        assert!(printed.contains("thor"));
        assert!(!printed.contains("mjolnir"));
    }

    #[test]
    fn test_new_password_length_rules() {
        assert!(check_new_password("short").is_err());
        assert!(check_new_password("long enough").is_ok());
        assert!(check_new_password(&"x".repeat(MAX_PASSWORD_LENGTH + 1)).is_err());
    }
}

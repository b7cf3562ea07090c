// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Password Hashing
//!
//! Argon2id with the crate's default parameters, stored as PHC strings so the
//! parameters travel with each hash. Both operations are CPU bound; the async
//! variants run them on tokio's blocking pool.

use argon2::password_hash::errors::Error as PasswordHashError;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use rand_core::OsRng;
use thiserror::Error;
use tokio::task::JoinError;

use crate::domain::identity::MAX_PASSWORD_LENGTH;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password exceeds {MAX_PASSWORD_LENGTH} bytes")]
    TooLong,

    #[error("failed to hash password: {0}")]
    Hash(PasswordHashError),

    #[error("stored password hash is unusable: {0}")]
    Verify(PasswordHashError),

    #[error("password worker did not finish: {0}")]
    Worker(#[from] JoinError),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(PasswordError::TooLong);
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// `Ok(false)` for a wrong password; `Err` only when `stored` cannot be used.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        return Ok(false);
    }
    let parsed = PasswordHash::new(stored).map_err(PasswordError::Verify)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(err) => Err(PasswordError::Verify(err)),
    }
}

pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(password: String, stored: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_the_original_password() {
        let stored = hash_password("correct horse").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &stored).unwrap());
        assert!(!verify_password("correct horse!", &stored).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("battery staple").unwrap();
        let second = hash_password("battery staple").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(PasswordError::Verify(_))
        ));
    }

    #[test]
    fn test_oversized_password_is_refused() {
        let huge = "p".repeat(MAX_PASSWORD_LENGTH + 1);
        assert!(matches!(hash_password(&huge), Err(PasswordError::TooLong)));

        let stored = hash_password("reasonable").unwrap();
        assert!(!verify_password(&huge, &stored).unwrap());
    }

    #[tokio::test]
    async fn test_blocking_wrappers_round_trip() {
        let stored = hash_password_blocking("on the pool".to_string()).await.unwrap();
        assert!(verify_password_blocking("on the pool".to_string(), stored).await.unwrap());
    }
}

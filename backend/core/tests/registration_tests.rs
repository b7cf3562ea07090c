// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Self-service accounts: registration always yields a member, passwords are
//! stored hashed, and login reflects the account as it is stored now.

mod common;

use std::sync::Arc;

use common::Fixture;
use food_ordering_core::application::auth::{AuthService, Login, Registration, StandardAuthService};
use food_ordering_core::application::user::UserUpdate;
use food_ordering_core::application::ServiceError;
use food_ordering_core::domain::actor::{Country, Role};
use food_ordering_core::domain::identity::{Credentials, IdentityError, IdentityProvider};
use food_ordering_core::infrastructure::JwtIdentityProvider;

struct Accounts {
    fixture: Fixture,
    identity: Arc<JwtIdentityProvider>,
    auth: StandardAuthService,
}

async fn accounts() -> Accounts {
    let fixture = Fixture::seeded().await;
    let users = fixture.services.repositories.users.clone();
    let identity = Arc::new(JwtIdentityProvider::new("registration-secret", 30, users.clone()));
    let auth = StandardAuthService::new(users, identity.clone());
    Accounts {
        fixture,
        identity,
        auth,
    }
}

fn registration(username: &str, password: &str) -> Registration {
    Registration {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password: password.to_string(),
        country: Country::America,
    }
}

fn login(username: &str, password: &str) -> Login {
    Login {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn test_registered_member_has_hashed_password() {
    let accounts = accounts().await;
    let session = accounts
        .auth
        .register(registration("  rocket ", "trash-panda-99"))
        .await
        .unwrap();

    assert_eq!(session.user.username, "rocket");
    assert_eq!(session.user.role, Role::Member);
    assert_eq!(session.user.country, Some(Country::America));

    let stored = accounts
        .fixture
        .services
        .repositories
        .users
        .find_by_username("rocket")
        .await
        .unwrap()
        .unwrap();
    let hash = stored.password_hash.as_deref().unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("trash-panda-99"));

    let actor = accounts
        .identity
        .authenticate(&Credentials::Bearer(session.access))
        .await
        .unwrap();
    assert_eq!(actor.id(), stored.id);
}

#[tokio::test]
async fn test_registration_validation() {
    let accounts = accounts().await;

    for input in [
        registration("", "long-enough-1"),
        registration("groot", "i-am-g"),
        registration("travis", "long-enough-1"),
    ] {
        let err = accounts.auth.register(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)), "{err}");
    }
}

#[tokio::test]
async fn test_login_uses_current_account_state() {
    let accounts = accounts().await;
    let member = accounts
        .auth
        .register(registration("drax", "destroyer-of-1"))
        .await
        .unwrap()
        .user;

    let admin = accounts.fixture.actor("nick_fury");
    accounts
        .fixture
        .services
        .users
        .update_user(
            &admin,
            member.id,
            UserUpdate {
                role: Some(Role::Manager),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let session = accounts.auth.login(login("drax", "destroyer-of-1")).await.unwrap();
    assert_eq!(session.user.role, Role::Manager);
    assert!(session.user.password_hash.is_some(), "an admin update keeps the password");

    accounts
        .fixture
        .services
        .users
        .update_user(
            &admin,
            member.id,
            UserUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        accounts.auth.login(login("drax", "destroyer-of-1")).await,
        Err(ServiceError::Identity(IdentityError::InactiveUser))
    ));
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let accounts = accounts().await;
    accounts
        .auth
        .register(registration("mantis", "empath-sleep"))
        .await
        .unwrap();

    assert!(matches!(
        accounts.auth.login(login("mantis", "empath-sleeP")).await,
        Err(ServiceError::Identity(IdentityError::InvalidCredentials))
    ));
}

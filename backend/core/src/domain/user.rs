// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::{Actor, Country, Role};
use crate::domain::ids::UserId;
use crate::domain::resource::{AttrValue, Scoped};

/// Persisted account. The actor a request runs as is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub country: Option<Country>,
    pub is_active: bool,
    /// Argon2 PHC string. Accounts without one cannot log in with a password.
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role, country: Option<Country>) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            role,
            country,
            is_active: true,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.username.clone(), self.role, self.country)
    }
}

impl Scoped for User {
    fn attribute(&self, field: &str) -> Option<AttrValue> {
        match field {
            "id" => Some(AttrValue::Id(self.id.as_uuid())),
            "country" => self.country.map(AttrValue::Country),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_carries_user_claims() {
        let user = User::new("captain_marvel", "carol@example.com", Role::Manager, Some(Country::India));
        let actor = user.actor();
        assert_eq!(actor.id(), user.id);
        assert_eq!(actor.role(), Role::Manager);
        assert_eq!(actor.country(), Some(Country::India));
        assert!(actor.is_authenticated());
    }

    #[test]
    fn test_password_hash_is_never_serialized() {
        let mut user = User::new("thor", "thor@example.com", Role::Member, Some(Country::India));
        user.password_hash = Some("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "thor");
    }

    #[test]
    fn test_user_without_country_has_no_country_attribute() {
        let user = User::new("new_hire", "new@example.com", Role::Member, None);
        assert_eq!(user.attribute("country"), None);
        assert_eq!(user.attribute("id"), Some(AttrValue::Id(user.id.as_uuid())));
    }
}

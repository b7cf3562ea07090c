// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Scope predicate rendering
//!
//! Turns a domain [`Predicate`] into a SQL boolean expression over a table
//! alias. Direct predicates compare a column of the row itself; indirect ones
//! become an `EXISTS` sub-select joining along the relation path:
//!
//! ```text
//! menu item, manager in INDIA:
//!   EXISTS (SELECT 1 FROM menu_categories s1
//!           JOIN restaurants s2 ON s2.id = s1.restaurant_id
//!           WHERE s1.id = t.category_id AND s2.country = $1)
//! ```
//!
//! Column and table names come only from the static descriptor table; values
//! are always bound as parameters.

use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use crate::domain::resource::{AttrValue, Predicate, ResourceKind};

pub fn table_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::User => "users",
        ResourceKind::Restaurant => "restaurants",
        ResourceKind::MenuCategory => "menu_categories",
        ResourceKind::MenuItem => "menu_items",
        ResourceKind::Order => "orders",
        ResourceKind::OrderItem => "order_items",
        ResourceKind::PaymentMethod => "payment_methods",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeParam {
    Text(String),
    Uuid(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScope {
    pub clause: String,
    pub params: Vec<ScopeParam>,
}

impl SqlScope {
    /// Render `predicate` against `alias`, numbering placeholders from `first_param`.
    pub fn render(predicate: &Predicate, alias: &str, first_param: usize) -> Self {
        match predicate {
            Predicate::All => Self {
                clause: "TRUE".to_string(),
                params: Vec::new(),
            },
            Predicate::Nothing => Self {
                clause: "FALSE".to_string(),
                params: Vec::new(),
            },
            Predicate::Equals { path, field, value, .. } => {
                let param = match value {
                    AttrValue::Country(country) => ScopeParam::Text(country.as_str().to_string()),
                    AttrValue::Id(id) => ScopeParam::Uuid(*id),
                };

                let Some((first, rest)) = path.split_first() else {
                    return Self {
                        clause: format!("{alias}.{field} = ${first_param}"),
                        params: vec![param],
                    };
                };

                let mut sql = format!("EXISTS (SELECT 1 FROM {} s1", table_name(first.target));
                for (i, hop) in rest.iter().enumerate() {
                    let prev = i + 1;
                    let next = i + 2;
                    sql.push_str(&format!(
                        " JOIN {} s{next} ON s{next}.id = s{prev}.{}",
                        table_name(hop.target),
                        hop.foreign_key
                    ));
                }
                sql.push_str(&format!(
                    " WHERE s1.id = {alias}.{} AND s{}.{field} = ${first_param})",
                    first.foreign_key,
                    path.len()
                ));

                Self {
                    clause: sql,
                    params: vec![param],
                }
            }
        }
    }

    pub fn next_param(&self, first_param: usize) -> usize {
        first_param + self.params.len()
    }

    pub fn bind<'q>(
        &self,
        mut query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        for param in &self.params {
            query = match param {
                ScopeParam::Text(text) => query.bind(text.clone()),
                ScopeParam::Uuid(id) => query.bind(*id),
            };
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{Actor, Country, Role};
    use crate::domain::ids::UserId;

    fn scope(kind: ResourceKind, actor: &Actor) -> SqlScope {
        SqlScope::render(&kind.descriptor().scope_filter(actor), "t", 1)
    }

    #[test]
    fn test_admin_and_nothing() {
        let admin = Actor::new(UserId::new(), "nick_fury", Role::Admin, Some(Country::America));
        assert_eq!(scope(ResourceKind::Order, &admin).clause, "TRUE");
        let stateless = Actor::new(UserId::new(), "nobody", Role::Manager, None);
        assert_eq!(scope(ResourceKind::Restaurant, &stateless).clause, "FALSE");
    }

    #[test]
    fn test_direct_country() {
        let manager = Actor::new(UserId::new(), "captain_america", Role::Manager, Some(Country::America));
        let rendered = scope(ResourceKind::Order, &manager);
        assert_eq!(rendered.clause, "t.country = $1");
        assert_eq!(rendered.params, vec![ScopeParam::Text("AMERICA".into())]);
    }

    #[test]
    fn test_owner_scope_binds_uuid() {
        let id = UserId::new();
        let member = Actor::new(id, "thor", Role::Member, Some(Country::India));
        let rendered = SqlScope::render(&ResourceKind::PaymentMethod.descriptor().scope_filter(&member), "pm", 3);
        assert_eq!(rendered.clause, "pm.user_id = $3");
        assert_eq!(rendered.params, vec![ScopeParam::Uuid(id.as_uuid())]);
        assert_eq!(rendered.next_param(3), 4);
    }

    #[test]
    fn test_indirect_scope_renders_join_chain() {
        let manager = Actor::new(UserId::new(), "captain_marvel", Role::Manager, Some(Country::India));

        assert_eq!(
            scope(ResourceKind::MenuCategory, &manager).clause,
            "EXISTS (SELECT 1 FROM restaurants s1 WHERE s1.id = t.restaurant_id AND s1.country = $1)"
        );
        assert_eq!(
            scope(ResourceKind::MenuItem, &manager).clause,
            "EXISTS (SELECT 1 FROM menu_categories s1 JOIN restaurants s2 ON s2.id = s1.restaurant_id \
             WHERE s1.id = t.category_id AND s2.country = $1)"
        );
    }

    #[test]
    fn test_member_order_items_follow_order_owner() {
        let id = UserId::new();
        let member = Actor::new(id, "thanos", Role::Member, Some(Country::India));
        let rendered = scope(ResourceKind::OrderItem, &member);
        assert_eq!(
            rendered.clause,
            "EXISTS (SELECT 1 FROM orders s1 WHERE s1.id = t.order_id AND s1.user_id = $1)"
        );
        assert_eq!(rendered.params, vec![ScopeParam::Uuid(id.as_uuid())]);
    }
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod db;
pub mod event_bus;
pub mod identity;
pub mod password;
pub mod repositories;

pub use identity::JwtIdentityProvider;
pub use repositories::InMemoryStore;

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod auth;
pub mod catalog;
pub mod error;
pub mod order;
pub mod payment;
pub mod policy;
pub mod repository_factory;
pub mod seed;
pub mod services;
pub mod user;

pub use error::ServiceError;
pub use repository_factory::{create_repositories, Repositories};
pub use services::Services;

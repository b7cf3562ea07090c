// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects, the resource descriptor table and the policy
//! engine. Nothing in this layer performs I/O.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Business rules for actors, catalog, orders and payments

pub mod actor;
pub mod catalog;
pub mod config;
pub mod events;
pub mod identity;
pub mod ids;
pub mod money;
pub mod order;
pub mod payment;
pub mod policy;
pub mod repository;
pub mod resource;
pub mod search;
pub mod user;

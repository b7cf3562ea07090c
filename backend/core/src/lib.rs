// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Food ordering backend core.
//!
//! # Architecture
//!
//! - **domain:** actors, catalog, orders, payment methods, resource
//!   descriptors and the policy engine
//! - **application:** services that run every operation through the policy engine
//! - **infrastructure:** event bus, JWT identity, in-memory and PostgreSQL storage
//! - **presentation:** axum HTTP API

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;

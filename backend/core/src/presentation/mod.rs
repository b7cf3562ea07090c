// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`food-ordering-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here; authorization, scoping and state
//! transitions are all decided in `crate::application`.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | REST endpoints, bearer-token actor extraction, error mapping |

pub mod api;

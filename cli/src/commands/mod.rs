// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the food ordering CLI

pub mod config;
pub mod migrate;
pub mod seed;

pub use self::config::ConfigCommand;
pub use self::migrate::MigrateCommand;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errand daemon library
//!
//! Exposes the engine and lifecycle so the `errandd` binary and the
//! workspace integration tests can run a daemon in-process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod engine;
pub mod env;
pub mod handlers;
pub mod lifecycle;
mod listener;

pub use lifecycle::{startup, Config, Daemon, LifecycleError, StartupResult};
pub use listener::Listener;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the broker, result store and worker fleet.
//!
//! The engine only sees the [`Broker`], [`ResultStore`] and [`FleetControl`]
//! traits. [`LocalBackend`] implements the first two on top of
//! `errand-storage`; fakes are exported behind the `test-support` feature.

pub mod broker;
pub mod fleet;
pub mod local;
pub mod store;

pub use broker::{Broker, BrokerError};
pub use fleet::{FleetControl, FleetError};
pub use local::{BackendStats, LocalBackend};
pub use store::{ResultStore, StoreError, UpdateOutcome};

#[cfg(any(test, feature = "test-support"))]
pub use broker::FakeBroker;
#[cfg(any(test, feature = "test-support"))]
pub use fleet::FakeFleet;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! errand-core: job model, state machine and handler registry for the Errand service

pub mod macros;

pub mod clock;
pub mod event;
pub mod fleet;
pub mod handler;
pub mod id;
pub mod job;
pub mod record;
pub mod retry;
pub mod status;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use event::Event;
pub use fleet::{FleetSnapshot, QueueCounts, TaskInfo, WorkerLoad};
pub use handler::{Handler, HandlerError, HandlerRegistry, RegistryError};
pub use id::{short, IdGen, UuidIdGen};
pub use job::{JobId, JobRequest};
pub use record::{JobRecord, StatusUpdate, TransitionError};
pub use retry::{RetryDecision, RetryPolicy};
pub use status::JobStatus;
pub use time_fmt::{format_elapsed, format_elapsed_ms};

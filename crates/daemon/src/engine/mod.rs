// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job engine: submission, execution, status and fleet health.

pub mod dispatcher;
pub mod maintenance;
pub mod monitor;
pub mod pool;
pub mod resolver;
pub mod worker;

pub use dispatcher::{DispatchError, Dispatcher, RevokeOutcome};
pub use maintenance::{Maintenance, MAINTENANCE_INTERVAL};
pub use monitor::{FleetMonitor, MonitorError};
pub use pool::WorkerPool;
pub use resolver::{JobView, Resolver};
pub use worker::{Control, Worker, WorkerConfig, WorkerDeps, WorkerError};

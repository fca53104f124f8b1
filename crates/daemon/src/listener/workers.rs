// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fleet health and daemon status.

use errand_wire::{ErrorKind, Response};

use super::ListenCtx;

pub(super) async fn handle_worker_status(ctx: &ListenCtx) -> Response {
    match ctx.monitor.health().await {
        Ok(snapshot) => Response::WorkerStatus {
            healthy: snapshot.healthy,
            workers: snapshot.workers,
            queue_status: snapshot.queue_counts,
            active_tasks: snapshot.tasks,
        },
        Err(e) => Response::error(ErrorKind::MonitorUnavailable, e.to_string()),
    }
}

pub(super) async fn handle_status(ctx: &ListenCtx) -> Response {
    let queued = match ctx.broker.depth().await {
        Ok(n) => n,
        Err(e) => return Response::error(ErrorKind::BrokerUnavailable, e.to_string()),
    };
    let records = match ctx.store.len().await {
        Ok(n) => n,
        Err(e) => return Response::error(ErrorKind::Internal, e.to_string()),
    };
    Response::Status {
        uptime_secs: ctx.start_time.elapsed().as_secs(),
        workers: ctx.worker_count,
        queued,
        records,
    }
}

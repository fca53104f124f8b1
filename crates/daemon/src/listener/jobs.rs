// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submit, result and revoke requests.

use errand_core::JobId;
use errand_wire::{ErrorKind, Response};
use tracing::warn;

use super::ListenCtx;
use crate::engine::DispatchError;

fn dispatch_error(e: DispatchError) -> Response {
    match e {
        DispatchError::Broker(e) => Response::error(ErrorKind::BrokerUnavailable, e.to_string()),
        DispatchError::Store(e) => Response::error(ErrorKind::Internal, e.to_string()),
    }
}

pub(super) async fn handle_submit(
    ctx: &ListenCtx,
    handler: &str,
    payload: serde_json::Value,
) -> Response {
    // Rejected payloads never get a job id.
    if let Err(e) = ctx.registry.validate(handler, &payload) {
        return Response::error(ErrorKind::Validation, e.to_string());
    }

    match ctx.dispatcher.submit(handler, payload).await {
        Ok(job_id) => Response::Submitted { job_id },
        Err(e) => {
            warn!(handler, error = %e, "submission failed");
            dispatch_error(e)
        }
    }
}

pub(super) async fn handle_get_result(ctx: &ListenCtx, job_id: JobId) -> Response {
    if job_id.is_empty() {
        return Response::error(ErrorKind::BadRequest, "job id is required");
    }
    match ctx.resolver.get_status(&job_id).await {
        Ok(view) => Response::JobResult {
            job_id: view.job_id,
            status: view.status,
            result: view.result,
            error: view.error,
        },
        Err(e) => Response::error(ErrorKind::Internal, e.to_string()),
    }
}

pub(super) async fn handle_revoke(ctx: &ListenCtx, job_id: JobId) -> Response {
    if job_id.is_empty() {
        return Response::error(ErrorKind::BadRequest, "job id is required");
    }
    match ctx.dispatcher.revoke(&job_id).await {
        Ok(outcome) => {
            Response::Revoked { job_id, revoked: outcome.revoked, status: outcome.status }
        }
        Err(e) => dispatch_error(e),
    }
}

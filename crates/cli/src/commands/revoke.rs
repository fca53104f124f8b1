// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand revoke` - cancel a job no worker has started

use anyhow::Result;
use clap::Args;
use errand_core::JobId;

use crate::client::DaemonClient;
use crate::client_queries::RevokeView;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct RevokeArgs {
    /// Job ID to revoke
    pub id: String,
}

pub async fn revoke(client: &DaemonClient, args: RevokeArgs, format: OutputFormat) -> Result<()> {
    let view = client.revoke(&JobId::from_string(args.id)).await.map_err(ExitError::from)?;
    format_or_json(format, &view, || println!("{}", render_revoke(&view)))
}

pub(crate) fn render_revoke(view: &RevokeView) -> String {
    let id = color::header(view.job_id.as_str());
    if view.revoked {
        format!("Revoked job {}", id)
    } else {
        format!("Job {} not revoked (status: {})", id, color::status(view.status))
    }
}

#[cfg(test)]
#[path = "revoke_tests.rs"]
mod tests;

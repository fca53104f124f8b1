// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand submit` - enqueue a job

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use serde_json::Value;

use crate::client::DaemonClient;
use crate::commands::result::{print_job, wait_for_job, POLL_INTERVAL};
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

pub const DEFAULT_HANDLER: &str = "first_n_primes";

#[derive(Args)]
pub struct SubmitArgs {
    /// How many primes to compute (shorthand for `--payload <n>`)
    #[arg(required_unless_present = "payload", conflicts_with = "payload")]
    pub n: Option<u64>,

    /// Handler to run
    #[arg(long, default_value = DEFAULT_HANDLER)]
    pub handler: String,

    /// Raw JSON payload for the handler
    #[arg(long)]
    pub payload: Option<String>,

    /// Wait for the job to finish and print its result
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait with --wait
    #[arg(long, default_value = "30", requires = "wait")]
    pub timeout: u64,
}

pub async fn submit(client: &DaemonClient, args: SubmitArgs, format: OutputFormat) -> Result<()> {
    let payload = build_payload(args.n, args.payload.as_deref())?;
    let job_id = client.submit(&args.handler, payload).await.map_err(ExitError::from)?;

    if args.wait {
        let timeout = Duration::from_secs(args.timeout);
        let waited = wait_for_job(client, &job_id, timeout, POLL_INTERVAL).await?;
        return print_job(waited, format);
    }

    let obj = serde_json::json!({ "job_id": job_id });
    format_or_json(format, &obj, || println!("{}", job_id))
}

/// Payload from the positional shorthand or the raw `--payload` JSON.
pub(crate) fn build_payload(n: Option<u64>, raw: Option<&str>) -> Result<Value> {
    match (n, raw) {
        (Some(n), _) => Ok(Value::from(n)),
        (None, Some(raw)) => {
            serde_json::from_str(raw).with_context(|| format!("invalid --payload JSON: {raw}"))
        }
        (None, None) => Err(anyhow!("either <N> or --payload is required")),
    }
}

#[cfg(test)]
#[path = "submit_tests.rs"]
mod tests;

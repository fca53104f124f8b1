// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand result` - poll a job's status

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use errand_core::JobId;
use tokio::time::Instant;

use crate::client::{ClientError, DaemonClient};
use crate::client_queries::JobView;
use crate::color;
use crate::exit_error::{ExitError, EXIT_TIMEOUT};
use crate::output::{format_or_json, format_value, OutputFormat};

pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Args)]
pub struct ResultArgs {
    /// Job ID returned by `errand submit`
    pub id: String,

    /// Keep polling until the job reaches a final status
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait with --wait
    #[arg(long, default_value = "30", requires = "wait")]
    pub timeout: u64,
}

/// Outcome of polling a job against a deadline.
#[derive(Debug, PartialEq)]
pub enum Waited {
    Settled(JobView),
    TimedOut(JobView),
}

pub async fn result(client: &DaemonClient, args: ResultArgs, format: OutputFormat) -> Result<()> {
    let job_id = JobId::from_string(args.id);
    if !args.wait {
        let view = client.get_result(&job_id).await.map_err(ExitError::from)?;
        return print_job(Waited::Settled(view), format);
    }
    let waited = wait_for_job(client, &job_id, Duration::from_secs(args.timeout), POLL_INTERVAL)
        .await?;
    print_job(waited, format)
}

pub(crate) async fn wait_for_job(
    client: &DaemonClient,
    job_id: &JobId,
    timeout: Duration,
    interval: Duration,
) -> Result<Waited, ExitError> {
    Ok(poll_until_final(|| client.get_result(job_id), timeout, interval).await?)
}

/// Poll until the job reaches a final status or `timeout` elapses.
pub(crate) async fn poll_until_final<F, Fut>(
    mut poll: F,
    timeout: Duration,
    interval: Duration,
) -> Result<Waited, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<JobView, ClientError>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        let view = poll().await?;
        if view.status.is_final() {
            return Ok(Waited::Settled(view));
        }
        if Instant::now() + interval > deadline {
            return Ok(Waited::TimedOut(view));
        }
        tokio::time::sleep(interval).await;
    }
}

/// Print the job; a wait that ran out of time exits non-zero after printing.
pub(crate) fn print_job(waited: Waited, format: OutputFormat) -> Result<()> {
    let (view, timed_out) = match waited {
        Waited::Settled(view) => (view, false),
        Waited::TimedOut(view) => (view, true),
    };
    format_or_json(format, &view, || print!("{}", render_job(&view)))?;
    if timed_out {
        let message = format!("job {} still {} after wait", view.job_id, view.status);
        return Err(ExitError::new(EXIT_TIMEOUT, message).into());
    }
    Ok(())
}

pub(crate) fn render_job(view: &JobView) -> String {
    let id = color::header(view.job_id.as_str());
    let mut out = format!("{} {}\n", id, color::status(view.status));
    if let Some(result) = &view.result {
        out.push_str(&format!("result: {}\n", format_value(result)));
    }
    if let Some(error) = &view.error {
        out.push_str(&format!("error: {}\n", error));
    }
    out
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand daemon` - Daemon management commands

use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use errand_daemon::Config;
use tokio::time::Instant;

use crate::client::DaemonClient;
use crate::client_queries::DaemonStatus;
use crate::daemon_process;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, format_uptime, OutputFormat};

/// How long `daemon stop` waits for the listener to go away.
const STOP_TIMEOUT: Duration = Duration::from_secs(15);
const STOP_POLL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon, draining running jobs
    Stop,
    /// Check daemon status
    Status,
}

pub async fn daemon(args: DaemonArgs, url: &str, format: OutputFormat) -> Result<()> {
    let client = DaemonClient::new(url, errand_daemon::env::ipc_timeout())
        .map_err(ExitError::from)?;
    match args.command {
        DaemonCommand::Start { foreground } => start(&client, url, foreground, format).await,
        DaemonCommand::Stop => stop(&client, format).await,
        DaemonCommand::Status => status(&client, format).await,
    }
}

async fn start(
    client: &DaemonClient,
    url: &str,
    foreground: bool,
    format: OutputFormat,
) -> Result<()> {
    if client.ping().await.is_ok() {
        let obj = serde_json::json!({ "status": "running", "addr": client.addr() });
        return format_or_json(format, &obj, || {
            println!("Daemon already running at {}", client.addr())
        });
    }

    if foreground {
        return daemon_process::run_foreground(url);
    }

    let log_path = Config::load().ok().map(|config| config.log_path);
    let addr = daemon_process::start_background(url, log_path.as_deref()).await?;
    let obj = serde_json::json!({ "status": "started", "addr": addr });
    format_or_json(format, &obj, || println!("Daemon started at {}", addr))
}

async fn stop(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    match client.shutdown().await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(anyhow!("failed to stop daemon: {}", e)),
    }

    let deadline = Instant::now() + STOP_TIMEOUT;
    while client.ping().await.is_ok() {
        if Instant::now() >= deadline {
            return Err(anyhow!("daemon still running after {}s", STOP_TIMEOUT.as_secs()));
        }
        tokio::time::sleep(STOP_POLL).await;
    }

    let obj = serde_json::json!({ "status": "stopped" });
    format_or_json(format, &obj, || println!("Daemon stopped"))
}

async fn status(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(ExitError::from(e).into()),
    };
    let version = client.hello().await.unwrap_or_else(|_| "unknown".to_string());

    let obj = status_json(&status, &version, client.addr());
    format_or_json(format, &obj, || print!("{}", render_status(&status, &version)))
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    let obj = serde_json::json!({ "status": "not_running" });
    format_or_json(format, &obj, || println!("Daemon not running"))
}

fn status_json(status: &DaemonStatus, version: &str, addr: &str) -> serde_json::Value {
    serde_json::json!({
        "status": "running",
        "version": version,
        "addr": addr,
        "uptime_secs": status.uptime_secs,
        "uptime": format_uptime(status.uptime_secs),
        "workers": status.workers,
        "queued": status.queued,
        "records": status.records,
    })
}

fn render_status(status: &DaemonStatus, version: &str) -> String {
    format!(
        "Status: running\nVersion: {}\nUptime: {}\nWorkers: {}\nQueued: {}\nRecords: {}\n",
        version,
        format_uptime(status.uptime_secs),
        status.workers,
        status.queued,
        status.records
    )
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;

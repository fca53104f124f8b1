// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand`: command-line client for the Errand job daemon.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_queries;
mod color;
mod commands;
mod daemon_process;
mod exit_error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use errand_daemon::env::DEFAULT_URL;

use crate::client::DaemonClient;
use crate::exit_error::{ExitError, EXIT_FAILURE};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "errand", version, about = "Submit and track background jobs")]
#[command(styles = color::styles())]
struct Cli {
    /// Daemon address
    #[arg(long, global = true, env = "ERRAND_URL", default_value = DEFAULT_URL)]
    url: String,

    /// Output format
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a job
    Submit(commands::submit::SubmitArgs),
    /// Show a job's status and result
    Result(commands::result::ResultArgs),
    /// Cancel a job that has not started
    Revoke(commands::revoke::RevokeArgs),
    /// Show fleet health and queue load
    Workers,
    /// Daemon management
    Daemon(commands::daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = match err.downcast_ref::<ExitError>() {
                Some(exit) => exit.code,
                None => EXIT_FAILURE,
            };
            eprintln!("error: {:#}", err);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = cli.output;
    let url = cli.url.as_str();
    match cli.command {
        Commands::Submit(args) => commands::submit::submit(&connect(url)?, args, format).await,
        Commands::Result(args) => commands::result::result(&connect(url)?, args, format).await,
        Commands::Revoke(args) => commands::revoke::revoke(&connect(url)?, args, format).await,
        Commands::Workers => commands::workers::workers(&connect(url)?, format).await,
        Commands::Daemon(args) => commands::daemon::daemon(args, url, format).await,
    }
}

fn connect(url: &str) -> Result<DaemonClient, ExitError> {
    Ok(DaemonClient::new(url, errand_daemon::env::ipc_timeout())?)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;

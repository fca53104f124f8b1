// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errandd`: the Errand job daemon.

use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use errand_daemon::{startup, Config, LifecycleError, StartupResult};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// First line each run writes to the log; the CLI scans from the last one.
const STARTUP_MARKER: &str = "Starting errandd";

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("errandd: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match init_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("errandd: cannot open log file {}: {}", config.log_path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    info!(pid = std::process::id(), "{}", STARTUP_MARKER);
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("daemon failed: {}", e);
            eprintln!("errandd: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to `<state_dir>/daemon.log`, filtered by `RUST_LOG` (default `info`).
fn init_logging(config: &Config) -> std::io::Result<WorkerGuard> {
    let dir = config.log_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file = config.log_path.file_name().unwrap_or(OsStr::new("daemon.log"));

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}

async fn run(config: Config) -> Result<(), LifecycleError> {
    let StartupResult { daemon, listener } = startup(&config).await?;
    let addr = listener.local_addr()?;
    tokio::spawn(listener.run());

    // The CLI waits for this line before reporting the daemon as started.
    println!("READY {}", addr);
    std::io::stdout().flush()?;

    let shutdown = daemon.shutdown_requested();
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = shutdown.notified() => info!("shutdown requested by client"),
        _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        _ = sigterm.recv() => info!("received SIGTERM"),
    }

    daemon.shutdown().await
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating and launching `errandd`.

use std::io::{BufRead, BufReader};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// How long `daemon start` waits for the READY line.
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

const STARTUP_MARKER: &str = "Starting errandd";
const FAILURE_PREFIX: &str = "daemon failed: ";

/// `errandd` next to the running executable, else from `PATH`.
pub fn find_errandd_binary() -> PathBuf {
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("errandd")));
    match sibling {
        Some(path) if path.exists() => path,
        _ => PathBuf::from("errandd"),
    }
}

/// Run `errandd` attached to this terminal until it exits.
pub fn run_foreground(url: &str) -> Result<()> {
    let binary = find_errandd_binary();
    let status = Command::new(&binary)
        .env("ERRAND_URL", url)
        .status()
        .with_context(|| format!("failed to run {}", binary.display()))?;
    if !status.success() {
        return Err(anyhow!("daemon exited with {}", status));
    }
    Ok(())
}

/// Spawn `errandd` detached and wait for it to report its bound address.
pub async fn start_background(url: &str, log_path: Option<&Path>) -> Result<String> {
    let binary = find_errandd_binary();
    let mut child = Command::new(&binary)
        .env("ERRAND_URL", url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .with_context(|| format!("failed to spawn {}", binary.display()))?;
    let stdout = child.stdout.take().ok_or_else(|| anyhow!("daemon stdout not captured"))?;

    let read_ready = tokio::task::spawn_blocking(move || -> std::io::Result<Option<String>> {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            if let Some(addr) = parse_ready_line(&line) {
                return Ok(Some(addr.to_string()));
            }
            line.clear();
        }
        Ok(None)
    });

    match tokio::time::timeout(READY_TIMEOUT, read_ready).await {
        Ok(Ok(Ok(Some(addr)))) => Ok(addr),
        Ok(Ok(Ok(None))) => {
            let _ = child.wait();
            Err(startup_failure(log_path))
        }
        Ok(Ok(Err(e))) => Err(anyhow!("failed to read daemon output: {}", e)),
        Ok(Err(e)) => Err(anyhow!("daemon output reader failed: {}", e)),
        Err(_) => {
            let _ = child.kill();
            Err(anyhow!("daemon did not become ready within {}s", READY_TIMEOUT.as_secs()))
        }
    }
}

fn startup_failure(log_path: Option<&Path>) -> anyhow::Error {
    let Some(path) = log_path else {
        return anyhow!("daemon exited before becoming ready");
    };
    let reason = std::fs::read_to_string(path).ok().and_then(|log| parse_startup_error(&log));
    match reason {
        Some(reason) => anyhow!("daemon failed to start: {}", reason),
        None => anyhow!("daemon exited before becoming ready (see {})", path.display()),
    }
}

/// Address from a `READY <addr>` line.
pub(crate) fn parse_ready_line(line: &str) -> Option<&str> {
    line.trim_end().strip_prefix("READY ").map(str::trim).filter(|addr| !addr.is_empty())
}

/// Failure reason logged by the most recent daemon run, if it failed.
pub(crate) fn parse_startup_error(log: &str) -> Option<String> {
    let start = log.rfind(STARTUP_MARKER)?;
    log[start..]
        .lines()
        .find_map(|line| line.split_once(FAILURE_PREFIX).map(|(_, reason)| reason.trim()))
        .map(str::to_string)
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use errand_core::{TaskInfo, WorkerLoad};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print `data` as pretty JSON, or run `text_fn` for human output.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

pub fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

/// One-line summary of a worker's load, e.g. "1 active, 0 reserved, 2 scheduled".
pub fn format_load(load: &WorkerLoad) -> String {
    format!(
        "{} active, {} reserved, {} scheduled",
        load.active.len(),
        load.reserved.len(),
        load.scheduled.len()
    )
}

/// Task line: short id, handler and, for deferred tasks, time until due.
pub fn format_task(task: &TaskInfo, now_ms: u64) -> String {
    let mut line = format!("{} {}", task.job_id.short(8), task.handler);
    if let Some(eta_ms) = task.eta_ms {
        let wait = eta_ms.saturating_sub(now_ms);
        line.push_str(&format!(" (in {})", errand_core::format_elapsed_ms(wait)));
    }
    line
}

/// Compact JSON for inline display; strings print without quotes.
pub fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

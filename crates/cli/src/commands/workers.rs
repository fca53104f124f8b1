// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `errand workers` - fleet health and queue load

use std::fmt::Write;

use anyhow::Result;

use crate::client::DaemonClient;
use crate::client_queries::FleetView;
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_load, format_or_json, format_task, now_ms, OutputFormat};

pub async fn workers(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let fleet = client.worker_status().await.map_err(ExitError::from)?;
    format_or_json(format, &fleet, || print!("{}", render_fleet(&fleet, now_ms())))
}

pub(crate) fn render_fleet(fleet: &FleetView, now_ms: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Fleet: {} ({} responding)",
        color::health(fleet.healthy),
        fleet.workers.len()
    );
    let counts = &fleet.queue_status;
    let _ = writeln!(
        out,
        "Queue: {} active, {} reserved, {} scheduled",
        counts.active, counts.reserved, counts.scheduled
    );

    for (worker, reply) in &fleet.workers {
        let _ = write!(out, "\n{}  {}", color::header(worker), color::muted(reply));
        let Some(load) = fleet.active_tasks.get(worker) else {
            out.push('\n');
            continue;
        };
        let _ = writeln!(out, "  {}", format_load(load));
        let buckets = [
            ("active", &load.active),
            ("reserved", &load.reserved),
            ("scheduled", &load.scheduled),
        ];
        for (label, tasks) in buckets {
            for task in tasks {
                let _ = writeln!(out, "  {:<9} {}", label, format_task(task, now_ms));
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;

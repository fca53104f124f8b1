// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal colors for help text and job output.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use errand_core::JobStatus;
use std::io::IsTerminal;

pub mod codes {
    /// Section headers and ids: steel blue
    pub const HEADER: u8 = 74;
    /// Commands and literals: light grey
    pub const LITERAL: u8 = 250;
    /// Descriptions and context: medium grey
    pub const CONTEXT: u8 = 245;
    /// Secondary text: darker grey
    pub const MUTED: u8 = 240;
    pub const GOOD: u8 = 108;
    pub const WARN: u8 = 179;
    pub const BAD: u8 = 167;
}

/// Determine if color output should be enabled.
///
/// Priority: `NO_COLOR=1` disables → `COLOR=1` forces → TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Clap help styles in the same palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    let fg = |code: u8| Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(code))));
    Styles::styled()
        .header(fg(codes::HEADER))
        .literal(fg(codes::LITERAL))
        .placeholder(fg(codes::CONTEXT))
}

fn paint(code: u8, text: &str) -> String {
    if should_colorize() {
        format!("\x1b[38;5;{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

pub fn header(text: &str) -> String {
    paint(codes::HEADER, text)
}

pub fn muted(text: &str) -> String {
    paint(codes::MUTED, text)
}

/// Job status label, colored by outcome.
pub fn status(status: JobStatus) -> String {
    let code = match status {
        JobStatus::Success => codes::GOOD,
        JobStatus::Failure => codes::BAD,
        JobStatus::Retry => codes::WARN,
        JobStatus::Revoked => codes::MUTED,
        JobStatus::Pending | JobStatus::Started => codes::CONTEXT,
    };
    paint(code, status.as_str())
}

/// Fleet health label.
pub fn health(healthy: bool) -> String {
    if healthy {
        paint(codes::GOOD, "healthy")
    } else {
        paint(codes::BAD, "unhealthy")
    }
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;

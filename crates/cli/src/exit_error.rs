// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use crate::client::ClientError;

/// Generic failure.
pub const EXIT_FAILURE: i32 = 1;
/// The daemon rejected the request itself (HTTP 4xx equivalent).
pub const EXIT_REJECTED: i32 = 2;
/// The daemon or one of its backends is unreachable (HTTP 503 equivalent).
pub const EXIT_UNAVAILABLE: i32 = 3;
/// `result --wait` gave up before the job settled.
pub const EXIT_TIMEOUT: i32 = 4;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ClientError> for ExitError {
    fn from(err: ClientError) -> Self {
        let code = match (&err, err.kind()) {
            (ClientError::NotRunning { .. }, _) => EXIT_UNAVAILABLE,
            (_, Some(kind)) => match kind.status_code() {
                503 => EXIT_UNAVAILABLE,
                400..=499 => EXIT_REJECTED,
                _ => EXIT_FAILURE,
            },
            _ => EXIT_FAILURE,
        };
        Self::new(code, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;

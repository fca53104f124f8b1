// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon endpoint URLs (`tcp://host:port`).

use thiserror::Error;

const SCHEME: &str = "tcp://";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("unsupported endpoint scheme in {0:?} (expected tcp://host:port)")]
    Scheme(String),
    #[error("missing port in endpoint {0:?}")]
    MissingPort(String),
}

/// Socket address (`host:port`) for an endpoint URL. A bare `host:port`
/// is accepted as-is.
pub fn endpoint_address(url: &str) -> Result<String, EndpointError> {
    let url = url.trim();
    let address = match url.split_once("://") {
        Some(_) => {
            url.strip_prefix(SCHEME).ok_or_else(|| EndpointError::Scheme(url.to_string()))?
        }
        None => url,
    };
    let address = address.trim_end_matches('/');
    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            Ok(address.to_string())
        }
        _ => Err(EndpointError::MissingPort(url.to_string())),
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;

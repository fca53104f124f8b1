// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP client for the Errand daemon.
//!
//! Each call opens a fresh connection, writes one request and reads one
//! response.

use std::time::Duration;

use errand_wire::{EndpointError, ErrorKind, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::TcpStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error("daemon not running at {addr}")]
    NotRunning { addr: String },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{kind}: {message}")]
    Rejected { kind: ErrorKind, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning { .. })
    }

    /// Error class reported by the daemon, if it answered at all.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Rejected { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaemonClient {
    addr: String,
    timeout: Duration,
}

impl DaemonClient {
    /// Build a client for `url` (`tcp://host:port` or `host:port`).
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let addr = errand_wire::endpoint_address(url)?;
        Ok(Self { addr, timeout })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub(crate) async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let connect = tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr));
        let mut stream = match connect.await {
            Ok(Ok(stream)) => stream,
            Ok(Err(_)) | Err(_) => {
                return Err(ClientError::NotRunning { addr: self.addr.clone() })
            }
        };
        let (mut reader, mut writer) = stream.split();
        errand_wire::write_request(&mut writer, request, self.timeout).await?;
        let response = errand_wire::read_response(&mut reader, self.timeout).await?;
        Ok(response)
    }

    /// Turn a response the caller did not expect into an error.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { kind, message } => Err(ClientError::Rejected { kind, message }),
            other => Err(ClientError::Unexpected(format!("{:?}", other))),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

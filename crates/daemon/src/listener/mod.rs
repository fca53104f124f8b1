// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling client connections.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each one on its own task. Every connection carries exactly one request
//! and one response.

mod jobs;
mod workers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use errand_adapters::{Broker, ResultStore};
use errand_core::{HandlerRegistry, SystemClock};
use errand_wire::{ProtocolError, Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::engine::{Dispatcher, FleetMonitor, Resolver};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub dispatcher: Dispatcher<SystemClock>,
    pub resolver: Resolver,
    pub monitor: FleetMonitor,
    /// Boundary validation for submissions
    pub registry: HandlerRegistry,
    pub broker: Arc<dyn Broker>,
    pub store: Arc<dyn ResultStore>,
    pub worker_count: usize,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
    pub ipc_timeout: Duration,
}

/// Listener task for accepting TCP connections.
pub struct Listener {
    tcp: TcpListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub(crate) fn new(tcp: TcpListener, ctx: Arc<ListenCtx>) -> Self {
        Self { tcp, ctx }
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.tcp.local_addr()
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.tcp.accept().await {
                Ok((stream, addr)) => {
                    debug!("TCP connection from {}", addr);
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("TCP accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// If the client closes the connection before the handler completes (e.g.
/// a CLI timeout), the handler future is dropped. A submission that already
/// reached the broker stays published.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = match errand_wire::read_request(&mut reader, ctx.ipc_timeout).await {
        Ok(request) => request,
        Err(ProtocolError::Json(e)) => {
            let response = Response::error(errand_wire::ErrorKind::BadRequest, e.to_string());
            errand_wire::write_response(&mut writer, &response, ctx.ipc_timeout).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Log queries at debug level (frequent polling), other requests at info
    if request.is_query() {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = tokio::select! {
        response = handle_request(request, ctx) => response,
        _ = detect_client_disconnect(&mut reader) => {
            debug!("Client disconnected, dropping request");
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);
    errand_wire::write_response(&mut writer, &response, ctx.ipc_timeout).await?;

    Ok(())
}

/// Resolves once the client closes its side (or sends unexpected bytes).
async fn detect_client_disconnect<R: AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "protocol version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Submit { handler, payload } => jobs::handle_submit(ctx, &handler, payload).await,

        Request::GetResult { job_id } => jobs::handle_get_result(ctx, job_id).await,

        Request::Revoke { job_id } => jobs::handle_revoke(ctx, job_id).await,

        Request::WorkerStatus => workers::handle_worker_status(ctx).await,

        Request::Status => workers::handle_status(ctx).await,

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response protocol between Errand clients and the daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod endpoint;
mod request;
mod response;
mod wire;

pub use endpoint::{endpoint_address, EndpointError};
pub use request::Request;
pub use response::{ErrorKind, Response};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_SIZE};
pub use wire::{read_request, read_response, write_request, write_response};

/// Protocol version exchanged in the `Hello` handshake.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

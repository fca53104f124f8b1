// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job handlers and the registry that maps names to them.
//!
//! Handlers are statically typed: each declares its input and output types
//! and the registry erases them behind [`DynHandler`] so that the dispatcher
//! and workers only ever see `serde_json::Value` payloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure raised while running a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Payload did not match the handler's input type
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    /// Worth another attempt (resource briefly unavailable, etc.)
    #[error("{0}")]
    Transient(String),
    #[error("{0}")]
    Fatal(String),
}

impl HandlerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }
}

/// Errors from looking up or validating against the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown handler: {0}")]
    UnknownHandler(String),
    #[error("invalid payload for {handler}: {reason}")]
    InvalidPayload { handler: String, reason: String },
}

/// A named, pure unit of work.
///
/// `validate` runs at the submission boundary; `run` runs on a worker's
/// blocking pool and may be invoked more than once for the same job.
pub trait Handler: Send + Sync + 'static {
    type Input: DeserializeOwned;
    type Output: Serialize;

    fn name(&self) -> &'static str;

    fn validate(&self, _input: &Self::Input) -> Result<(), String> {
        Ok(())
    }

    fn run(&self, input: Self::Input) -> Result<Self::Output, HandlerError>;
}

/// Type-erased handler operating on JSON values.
pub trait DynHandler: Send + Sync {
    fn validate(&self, payload: &serde_json::Value) -> Result<(), String>;
    fn invoke(&self, payload: serde_json::Value) -> Result<serde_json::Value, HandlerError>;
}

impl<H: Handler> DynHandler for H {
    fn validate(&self, payload: &serde_json::Value) -> Result<(), String> {
        let input = H::Input::deserialize(payload).map_err(|e| e.to_string())?;
        Handler::validate(self, &input)
    }

    fn invoke(&self, payload: serde_json::Value) -> Result<serde_json::Value, HandlerError> {
        let input: H::Input = serde_json::from_value(payload)
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;
        let output = self.run(input)?;
        serde_json::to_value(output).map_err(|e| HandlerError::Fatal(e.to_string()))
    }
}

/// Name → handler table, populated at startup and shared read-only.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn DynHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under its own name, replacing any previous entry.
    pub fn register<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.handlers.insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    pub fn with<H: Handler>(mut self, handler: H) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Boundary check: the handler exists and accepts `payload`.
    pub fn validate(&self, name: &str, payload: &serde_json::Value) -> Result<(), RegistryError> {
        let handler =
            self.handlers.get(name).ok_or_else(|| RegistryError::UnknownHandler(name.to_string()))?;
        handler.validate(payload).map_err(|reason| RegistryError::InvalidPayload {
            handler: name.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry").field("handlers", &self.handlers.keys()).finish()
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;

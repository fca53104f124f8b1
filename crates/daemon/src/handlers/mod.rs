// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers shipped with the daemon.

mod primes;

pub use primes::{is_prime, FirstNPrimes, MAX_PRIMES};

use errand_core::HandlerRegistry;

/// Registry holding every built-in handler.
pub fn builtin_registry() -> HandlerRegistry {
    HandlerRegistry::new().with(FirstNPrimes)
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `first_n_primes`: the first `n` primes in ascending order.

use errand_core::{Handler, HandlerError};

/// Upper bound on `n`, keeping a single job's runtime bounded
pub const MAX_PRIMES: u32 = 10_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstNPrimes;

impl Handler for FirstNPrimes {
    type Input = u32;
    type Output = Vec<u64>;

    fn name(&self) -> &'static str {
        "first_n_primes"
    }

    fn validate(&self, n: &u32) -> Result<(), String> {
        match *n {
            0 => Err("n must be a positive integer".to_string()),
            n if n > MAX_PRIMES => Err(format!("n must be at most {}", MAX_PRIMES)),
            _ => Ok(()),
        }
    }

    fn run(&self, n: u32) -> Result<Vec<u64>, HandlerError> {
        Handler::validate(self, &n).map_err(HandlerError::InvalidPayload)?;

        let mut primes = Vec::with_capacity(n as usize);
        let mut candidate = 2u64;
        while primes.len() < n as usize {
            if is_prime(candidate) {
                primes.push(candidate);
            }
            candidate += 1;
        }
        Ok(primes)
    }
}

/// Trial division up to the square root.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
#[path = "primes_tests.rs"]
mod tests;

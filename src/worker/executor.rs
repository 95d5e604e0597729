use std::time::Instant;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::broker::Task;

/// Work order parsed from a task payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    pub exponent: u64,
}

/// Outcome of checking one candidate `2^p - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// `p` is prime and `2^p - 1` passed the Lucas-Lehmer test.
    MersennePrime,
    /// `p` is prime but `2^p - 1` is composite.
    Composite,
    /// `p` itself is composite, so `2^p - 1` cannot be prime.
    ExponentNotPrime,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::MersennePrime => write!(f, "mersenne-prime"),
            Verdict::Composite => write!(f, "composite"),
            Verdict::ExponentNotPrime => write!(f, "exponent-not-prime"),
        }
    }
}

/// Parity of the perfect number `2^(p-1) * (2^p - 1)` implied by a Mersenne
/// prime. Always [`Parity::Even`] in practice (Euclid-Euler); result
/// consumers still track the column explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parity {
    Even,
    Odd,
}

impl std::fmt::Display for Parity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Parity::Even => write!(f, "even"),
            Parity::Odd => write!(f, "odd"),
        }
    }
}

/// Result of one completed check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckReport {
    pub exponent: u64,
    pub verdict: Verdict,
    /// `Some(Even)` exactly when a Mersenne prime was found.
    pub perfect_number_parity: Option<Parity>,
    pub elapsed_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Trial-divide `p` by odd candidates up to its square root.
///
/// Cheap filter ahead of the expensive Lucas-Lehmer run: a composite
/// exponent can never yield a Mersenne prime.
pub fn is_small_prime(p: u64) -> bool {
    if p < 2 {
        return false;
    }
    if p % 2 == 0 {
        return p == 2;
    }
    let mut d = 3;
    // d * d overflows once d passes 2^32.
    while d <= p / d {
        if p % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Lucas-Lehmer primality test for `M_p = 2^p - 1`.
///
/// Starts at s = 4 and squares-minus-two modulo `M_p` for `p - 2` rounds;
/// `M_p` is prime iff the final s is zero. The subtraction is folded into
/// the modular sum as `s^2 + (M_p - 2)` so the arithmetic stays unsigned.
/// `p = 2` is the one even prime and is special-cased (M_2 = 3).
pub fn lucas_lehmer(p: u64) -> bool {
    if p < 2 {
        return false;
    }
    if p == 2 {
        return true;
    }
    let m = (BigUint::one() << p) - 1u32;
    let minus_two = &m - 2u32;
    let mut s = BigUint::from(4u32);
    for _ in 0..(p - 2) {
        s = (&s * &s + &minus_two) % &m;
    }
    s.is_zero()
}

/// Runs Lucas-Lehmer checks for leased tasks.
///
/// The test is pure CPU on numbers thousands of bits wide; callers run
/// [`MersenneExecutor::check`] on the blocking pool rather than stalling an
/// async worker on it.
#[derive(Debug, Clone, Default)]
pub struct MersenneExecutor;

impl MersenneExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Parse the payload of `task` into a work order.
    ///
    /// `None` means the payload is malformed. Callers should discard the
    /// task rather than requeue it; every worker would fail it the same way.
    pub fn parse_request(task: &Task) -> Option<CheckRequest> {
        serde_json::from_value(task.payload.clone()).ok()
    }

    /// Check one candidate, blocking the current thread until done.
    pub fn check(&self, request: CheckRequest) -> CheckReport {
        let started = Instant::now();
        let p = request.exponent;

        let verdict = if !is_small_prime(p) {
            Verdict::ExponentNotPrime
        } else if lucas_lehmer(p) {
            Verdict::MersennePrime
        } else {
            Verdict::Composite
        };

        let perfect_number_parity = match verdict {
            Verdict::MersennePrime => Some(Parity::Even),
            _ => None,
        };

        let report = CheckReport {
            exponent: p,
            verdict,
            perfect_number_parity,
            elapsed_ms: started.elapsed().as_millis() as u64,
            completed_at: Utc::now(),
        };

        tracing::info!(
            exponent = p,
            verdict = %report.verdict,
            elapsed_ms = report.elapsed_ms,
            "Check completed"
        );

        report
    }
}

//! Volunteer-side compute for Mersenne candidates.
//!
//! Workers lease a task, run the Lucas-Lehmer test on `2^p - 1`, and report
//! back to the broker. The broker never looks inside a payload; everything
//! exponent-shaped lives here.
//!
//! # Components
//!
//! - [`MersenneExecutor`]: parses payloads and runs the checks
//! - [`CheckReport`]: what a finished check sends back upstream
//!
//! # Check Flow
//!
//! 1. A worker loop leases a task from the broker
//! 2. [`MersenneExecutor::parse_request`] reads the exponent out of the payload
//! 3. Trial division filters composite exponents, Lucas-Lehmer decides the rest
//! 4. The resulting [`CheckReport`] rides back with the acknowledgment

pub mod executor;

pub use executor::{CheckReport, CheckRequest, MersenneExecutor, Parity, Verdict};

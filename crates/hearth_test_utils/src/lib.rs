//! # Hearth Test Utilities
//!
//! Shared testing utilities for all crates:
//! - State fixtures and builders
//! - Session replay and tick-cadence harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;

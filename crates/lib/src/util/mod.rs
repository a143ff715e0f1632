//! Shared utilities.
//!
//! File system helpers used by the executors, plus test helpers.

pub mod fs;

#[cfg(test)]
pub mod testutil;

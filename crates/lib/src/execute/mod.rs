//! Transform execution.
//!
//! This module provides the two executors and the pool they run on:
//! - `full_transform`: every unit, unconditionally
//! - `incremental_transform`: only added, changed and removed units/files
//!
//! Both fan out across inputs, across unit kinds within an input and across
//! units (or changed files) within a kind. The first error short-circuits
//! the remaining work and is returned to the caller.

mod full;
mod incremental;
mod pool;
mod types;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::input::TransformInput;
use crate::output::OutputProvider;

pub use full::full_transform;
pub use incremental::incremental_transform;
pub use pool::WorkerPool;
pub use types::{ExecuteConfig, ExecuteError, TransformSummary};

pub(crate) use types::SummaryCounter;

/// Verifies that no two units share a destination.
///
/// Disjoint destinations are what lets units be written concurrently
/// without locking.
pub fn check_disjoint(inputs: &[TransformInput], outputs: &dyn OutputProvider) -> Result<(), ExecuteError> {
  let mut seen: HashMap<PathBuf, &str> = HashMap::new();

  for unit in inputs.iter().flat_map(TransformInput::units) {
    let location = unit.location(outputs);
    if let Some(first) = seen.insert(location.clone(), unit.name()) {
      return Err(ExecuteError::OverlappingOutputs {
        location,
        first: first.to_string(),
        second: unit.name().to_string(),
      });
    }
  }

  Ok(())
}

//! Types for transform execution.
//!
//! This module defines the error type, the run summary and the
//! configuration shared by the full and incremental executors.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use thiserror::Error;
use zip::result::ZipError;

use crate::transform::TransformerError;

/// Errors that can occur while transforming units.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// A transformer failed; nothing was written for this file or archive.
  #[error("transform failed for {location}: {source}")]
  Transform {
    location: String,
    #[source]
    source: TransformerError,
  },

  /// Reading, writing or deleting a file failed.
  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Previous outputs could not be cleared before a full run.
  #[error("failed to clear previous outputs: {0}")]
  Clean(#[source] io::Error),

  /// A jar could not be read or written.
  #[error("archive error in {}: {source}", path.display())]
  Archive {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  /// A directory unit could not be enumerated.
  #[error("failed to list {}: {source}", root.display())]
  Walk {
    root: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// A changed-file entry does not live under its directory unit.
  #[error("changed file {} is outside unit root {}", file.display(), root.display())]
  OutsideUnitRoot { file: PathBuf, root: PathBuf },

  /// Two units were allocated the same destination.
  #[error("units '{first}' and '{second}' both map to {}", location.display())]
  OverlappingOutputs {
    location: PathBuf,
    first: String,
    second: String,
  },
}

impl ExecuteError {
  pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> ExecuteError + '_ {
    move |source| ExecuteError::Io {
      path: path.to_path_buf(),
      source,
    }
  }

  pub(crate) fn archive(path: &Path) -> impl FnOnce(ZipError) -> ExecuteError + '_ {
    move |source| ExecuteError::Archive {
      path: path.to_path_buf(),
      source,
    }
  }
}

/// Outcome counts of one transform run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformSummary {
  /// Units that had at least one file read, written or deleted.
  pub units_processed: usize,
  /// Units skipped because nothing changed.
  pub units_skipped: usize,
  /// Destination files (directory files or whole jars) written.
  pub files_written: usize,
  /// Destination files or jars deleted.
  pub files_deleted: usize,
  /// Files inside directory units reported as unchanged.
  pub files_skipped: usize,
}

/// Thread-safe accumulator behind `TransformSummary`.
#[derive(Debug, Default)]
pub(crate) struct SummaryCounter {
  units_processed: AtomicUsize,
  units_skipped: AtomicUsize,
  files_written: AtomicUsize,
  files_deleted: AtomicUsize,
  files_skipped: AtomicUsize,
}

impl SummaryCounter {
  pub fn unit_processed(&self) {
    self.units_processed.fetch_add(1, Ordering::Relaxed);
  }

  pub fn unit_skipped(&self) {
    self.units_skipped.fetch_add(1, Ordering::Relaxed);
  }

  pub fn written(&self, count: usize) {
    self.files_written.fetch_add(count, Ordering::Relaxed);
  }

  pub fn deleted(&self) {
    self.files_deleted.fetch_add(1, Ordering::Relaxed);
  }

  pub fn file_skipped(&self) {
    self.files_skipped.fetch_add(1, Ordering::Relaxed);
  }

  pub fn finish(self) -> TransformSummary {
    TransformSummary {
      units_processed: self.units_processed.into_inner(),
      units_skipped: self.units_skipped.into_inner(),
      files_written: self.files_written.into_inner(),
      files_deleted: self.files_deleted.into_inner(),
      files_skipped: self.files_skipped.into_inner(),
    }
  }
}

/// Configuration for transform execution.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
  /// Number of worker threads in the shared pool.
  pub parallelism: usize,
}

impl Default for ExecuteConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

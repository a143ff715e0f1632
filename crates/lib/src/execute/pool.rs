//! The shared worker pool.

use std::fmt;
use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::ExecuteConfig;

/// Work-stealing pool shared by the executors and transformers.
///
/// A task blocked on nested parallel work (`join`, `par_iter`) keeps
/// executing queued tasks, so the three fan-out levels of a transform
/// can nest without starving the pool.
#[derive(Clone)]
pub struct WorkerPool {
  pool: Arc<ThreadPool>,
  threads: usize,
}

impl WorkerPool {
  pub fn new(parallelism: usize) -> Result<Self, ThreadPoolBuildError> {
    let threads = parallelism.max(1);
    let pool = ThreadPoolBuilder::new()
      .num_threads(threads)
      .thread_name(|index| format!("classweave-worker-{index}"))
      .build()?;

    Ok(Self {
      pool: Arc::new(pool),
      threads,
    })
  }

  pub fn from_config(config: &ExecuteConfig) -> Result<Self, ThreadPoolBuildError> {
    Self::new(config.parallelism)
  }

  pub fn threads(&self) -> usize {
    self.threads
  }

  /// Runs `op` inside the pool and blocks until it returns.
  pub fn install<R, F>(&self, op: F) -> R
  where
    F: FnOnce() -> R + Send,
    R: Send,
  {
    self.pool.install(op)
  }
}

impl fmt::Debug for WorkerPool {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WorkerPool").field("threads", &self.threads).finish()
  }
}

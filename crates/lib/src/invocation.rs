//! The invocation driver.
//!
//! One `TransformInvocation` runs exactly once, through three phases:
//! 1. Pre: the temporary directory is created and `on_pre_transform` runs
//!    for every transformer, in registry order
//! 2. Transform: the full or incremental executor runs to completion
//! 3. Post: `on_post_transform` runs for every transformer, in registry order
//!
//! A failed Pre aborts the invocation. A failed Transform still runs Post.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::context::TransformContext;
use crate::execute::{ExecuteError, TransformSummary, full_transform, incremental_transform};
use crate::input::TransformInput;
use crate::output::OutputProvider;
use crate::transform::{TransformerError, TransformerRegistry};

/// Whether the host asked for a full or an incremental run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
  Full,
  Incremental,
}

impl TransformMode {
  pub fn from_incremental(incremental: bool) -> Self {
    if incremental {
      TransformMode::Incremental
    } else {
      TransformMode::Full
    }
  }
}

impl fmt::Display for TransformMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TransformMode::Full => f.write_str("full"),
      TransformMode::Incremental => f.write_str("incremental"),
    }
  }
}

/// Where an invocation is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
  Pending,
  Pre,
  Transform,
  Post,
  Finished,
  Failed,
}

/// Errors that fail an invocation.
#[derive(Debug, Error)]
pub enum InvocationError {
  #[error("failed to create temporary directory {}: {source}", path.display())]
  TemporaryDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("pre-transform hook failed: {0}")]
  PreTransform(#[source] TransformerError),

  #[error("transform failed: {0}")]
  Transform(#[source] ExecuteError),

  #[error("post-transform hook failed: {0}")]
  PostTransform(#[source] TransformerError),

  /// The transform failed and a post hook failed afterwards.
  #[error("transform failed: {transform}; post-transform hook also failed: {post}")]
  TransformAndPost {
    #[source]
    transform: ExecuteError,
    post: TransformerError,
  },

  #[error("invocation has already run")]
  AlreadyRun,
}

/// One run of the transformer chain over a set of inputs.
pub struct TransformInvocation {
  context: TransformContext,
  registry: TransformerRegistry,
  inputs: Vec<TransformInput>,
  referenced_inputs: Vec<TransformInput>,
  outputs: Arc<dyn OutputProvider>,
  mode: TransformMode,
  phase: InvocationPhase,
}

impl TransformInvocation {
  pub fn new(
    context: TransformContext,
    registry: TransformerRegistry,
    outputs: impl OutputProvider + 'static,
    mode: TransformMode,
  ) -> Self {
    Self {
      context,
      registry,
      inputs: Vec::new(),
      referenced_inputs: Vec::new(),
      outputs: Arc::new(outputs),
      mode,
      phase: InvocationPhase::Pending,
    }
  }

  pub fn with_inputs(mut self, inputs: Vec<TransformInput>) -> Self {
    self.inputs = inputs;
    self
  }

  /// Inputs visible to the host but never transformed or written.
  pub fn with_referenced_inputs(mut self, inputs: Vec<TransformInput>) -> Self {
    self.referenced_inputs = inputs;
    self
  }

  pub fn context(&self) -> &TransformContext {
    &self.context
  }

  pub fn registry(&self) -> &TransformerRegistry {
    &self.registry
  }

  pub fn inputs(&self) -> &[TransformInput] {
    &self.inputs
  }

  pub fn referenced_inputs(&self) -> &[TransformInput] {
    &self.referenced_inputs
  }

  pub fn outputs(&self) -> &dyn OutputProvider {
    self.outputs.as_ref()
  }

  pub fn mode(&self) -> TransformMode {
    self.mode
  }

  pub fn phase(&self) -> InvocationPhase {
    self.phase
  }

  pub fn is_incremental(&self) -> bool {
    self.mode == TransformMode::Incremental
  }

  /// Runs all three phases. Fails with `AlreadyRun` on a second call.
  pub fn run(&mut self) -> Result<TransformSummary, InvocationError> {
    if self.phase != InvocationPhase::Pending {
      return Err(InvocationError::AlreadyRun);
    }

    info!(
      name = self.context.name(),
      mode = %self.mode,
      transformers = self.registry.len(),
      inputs = self.inputs.len(),
      referenced = self.referenced_inputs.len(),
      "starting transform invocation"
    );

    self.enter(InvocationPhase::Pre);
    if let Err(e) = self.pre_transform() {
      error!(error = %e, "pre-transform failed, aborting invocation");
      self.phase = InvocationPhase::Failed;
      return Err(e);
    }

    self.enter(InvocationPhase::Transform);
    let transformed = self.transform();
    if let Err(e) = &transformed {
      error!(error = %e, "transform failed");
    }

    self.enter(InvocationPhase::Post);
    let post = self.post_transform();

    let result = match (transformed, post) {
      (Ok(summary), Ok(())) => Ok(summary),
      (Ok(_), Err(post)) => Err(InvocationError::PostTransform(post)),
      (Err(transform), Ok(())) => Err(InvocationError::Transform(transform)),
      (Err(transform), Err(post)) => Err(InvocationError::TransformAndPost { transform, post }),
    };

    match &result {
      Ok(summary) => {
        self.phase = InvocationPhase::Finished;
        info!(
          processed = summary.units_processed,
          skipped = summary.units_skipped,
          written = summary.files_written,
          deleted = summary.files_deleted,
          "transform invocation complete"
        );
      }
      Err(_) => self.phase = InvocationPhase::Failed,
    }
    result
  }

  fn enter(&mut self, phase: InvocationPhase) {
    debug!(from = ?self.phase, to = ?phase, "invocation phase");
    self.phase = phase;
  }

  fn pre_transform(&self) -> Result<(), InvocationError> {
    let temporary_dir = self.context.temporary_dir();
    fs::create_dir_all(temporary_dir).map_err(|source| InvocationError::TemporaryDir {
      path: temporary_dir.to_path_buf(),
      source,
    })?;

    for transformer in self.registry.iter() {
      debug!(transformer = transformer.name(), "on_pre_transform");
      transformer
        .on_pre_transform(&self.context)
        .map_err(InvocationError::PreTransform)?;
    }
    Ok(())
  }

  fn transform(&self) -> Result<TransformSummary, ExecuteError> {
    let chain = self.registry.chain();
    match self.mode {
      TransformMode::Full => full_transform(&self.inputs, &chain, &self.context, self.outputs.as_ref()),
      TransformMode::Incremental => incremental_transform(&self.inputs, &chain, &self.context, self.outputs.as_ref()),
    }
  }

  /// Every hook runs even after an earlier one fails; the first error wins.
  fn post_transform(&self) -> Result<(), TransformerError> {
    let mut first = None;
    for transformer in self.registry.iter() {
      debug!(transformer = transformer.name(), "on_post_transform");
      if let Err(e) = transformer.on_post_transform(&self.context) {
        error!(transformer = transformer.name(), error = %e, "post-transform hook failed");
        first.get_or_insert(e);
      }
    }
    first.map_or(Ok(()), Err)
  }
}

impl fmt::Debug for TransformInvocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransformInvocation")
      .field("name", &self.context.name())
      .field("mode", &self.mode)
      .field("phase", &self.phase)
      .field("transformers", &self.registry)
      .field("inputs", &self.inputs.len())
      .finish_non_exhaustive()
  }
}

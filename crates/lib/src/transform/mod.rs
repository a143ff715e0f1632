//! Pluggable bytecode transformers.
//!
//! This module provides:
//! - `Transformer`: the three-hook contract every plugin implements
//! - `TransformerRegistry`: the explicit, ordered transformer set of one invocation
//! - `TransformerChain`: the left-to-right fold of that set over one buffer

mod chain;
mod registry;

use std::error::Error as StdError;

use thiserror::Error;

use crate::context::TransformContext;

pub use chain::TransformerChain;
pub use registry::{RegistryBuilder, TransformerRegistry};

/// Boxed error type transformers use to report arbitrary failures.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A failure raised by a transformer hook.
#[derive(Debug, Error)]
#[error("transformer '{transformer}' failed: {source}")]
pub struct TransformerError {
  /// Name of the transformer that failed.
  pub transformer: String,
  /// The underlying failure.
  #[source]
  pub source: BoxError,
}

impl TransformerError {
  pub fn new(transformer: impl Into<String>, source: impl Into<BoxError>) -> Self {
    Self {
      transformer: transformer.into(),
      source: source.into(),
    }
  }

  /// Builds an error from a plain message.
  pub fn msg(transformer: impl Into<String>, message: impl Into<String>) -> Self {
    let message: String = message.into();
    Self::new(transformer, message)
  }
}

/// A bytecode transformer.
///
/// `transform` is called concurrently for many units and must not keep
/// per-unit state. The hooks run once per invocation, sequentially, before
/// and after all unit work.
pub trait Transformer: Send + Sync {
  /// Stable name used in logs and errors.
  fn name(&self) -> &str;

  fn on_pre_transform(&self, _ctx: &TransformContext) -> Result<(), TransformerError> {
    Ok(())
  }

  /// Transforms one class file. Returning the input unchanged is valid.
  fn transform(&self, ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError>;

  fn on_post_transform(&self, _ctx: &TransformContext) -> Result<(), TransformerError> {
    Ok(())
  }
}

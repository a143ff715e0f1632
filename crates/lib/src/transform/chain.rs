//! Fold of the registered transformers over one class file.

use std::sync::Arc;

use super::{Transformer, TransformerError};
use crate::context::TransformContext;

/// Applies every transformer, in registry order, to one buffer.
///
/// The output of transformer `i` is the input of transformer `i + 1`. The
/// first error aborts the fold and the partial buffer is dropped.
#[derive(Clone)]
pub struct TransformerChain {
  transformers: Arc<[Arc<dyn Transformer>]>,
}

impl TransformerChain {
  pub(super) fn new(transformers: Arc<[Arc<dyn Transformer>]>) -> Self {
    Self { transformers }
  }

  pub fn len(&self) -> usize {
    self.transformers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.transformers.is_empty()
  }

  pub fn apply(&self, ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    self
      .transformers
      .iter()
      .try_fold(bytecode, |bytes, transformer| transformer.transform(ctx, bytes))
  }
}

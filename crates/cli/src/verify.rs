//! Built-in transformer that checks the class file magic number.

use classweave_lib::context::TransformContext;
use classweave_lib::transform::{Transformer, TransformerError};

const CLASS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Passes class files through unchanged, failing on anything without the magic.
pub struct MagicVerifier;

impl Transformer for MagicVerifier {
  fn name(&self) -> &str {
    "verify-magic"
  }

  fn transform(&self, _ctx: &TransformContext, bytecode: Vec<u8>) -> Result<Vec<u8>, TransformerError> {
    if bytecode.starts_with(&CLASS_MAGIC) {
      Ok(bytecode)
    } else {
      Err(TransformerError::msg(
        self.name(),
        format!("not a class file ({} bytes, missing CAFEBABE header)", bytecode.len()),
      ))
    }
  }
}

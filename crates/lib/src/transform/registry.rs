//! Explicit, ordered transformer registration.
//!
//! The order of a registry is declared, never discovered: ascending
//! priority, ties broken by registration sequence.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{Transformer, TransformerChain};

struct Registration {
  priority: i32,
  sequence: usize,
  transformer: Arc<dyn Transformer>,
}

/// Collects transformers before freezing them into a `TransformerRegistry`.
#[derive(Default)]
pub struct RegistryBuilder {
  registrations: Vec<Registration>,
}

impl RegistryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a transformer with the default priority (0).
  pub fn register<T: Transformer + 'static>(self, transformer: T) -> Self {
    self.register_with_priority(0, transformer)
  }

  pub fn register_with_priority<T: Transformer + 'static>(self, priority: i32, transformer: T) -> Self {
    self.register_shared(priority, Arc::new(transformer))
  }

  /// Registers an already shared transformer, e.g. one the caller keeps a handle to.
  pub fn register_shared(mut self, priority: i32, transformer: Arc<dyn Transformer>) -> Self {
    let sequence = self.registrations.len();
    self.registrations.push(Registration {
      priority,
      sequence,
      transformer,
    });
    self
  }

  pub fn build(mut self) -> TransformerRegistry {
    self.registrations.sort_by_key(|r| (r.priority, r.sequence));

    for (position, registration) in self.registrations.iter().enumerate() {
      debug!(
        position,
        priority = registration.priority,
        transformer = registration.transformer.name(),
        "registered transformer"
      );
    }

    let transformers: Vec<Arc<dyn Transformer>> = self.registrations.into_iter().map(|r| r.transformer).collect();
    TransformerRegistry {
      transformers: transformers.into(),
    }
  }
}

/// The frozen, ordered transformer set of one invocation.
///
/// Cloning is cheap; all clones share the same list.
#[derive(Clone)]
pub struct TransformerRegistry {
  transformers: Arc<[Arc<dyn Transformer>]>,
}

impl TransformerRegistry {
  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::new()
  }

  /// A registry with no transformers; its chain is the identity.
  pub fn empty() -> Self {
    RegistryBuilder::new().build()
  }

  pub fn len(&self) -> usize {
    self.transformers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.transformers.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Transformer>> {
    self.transformers.iter()
  }

  pub fn names(&self) -> Vec<&str> {
    self.transformers.iter().map(|t| t.name()).collect()
  }

  /// Returns the chain folding these transformers in registry order.
  pub fn chain(&self) -> TransformerChain {
    TransformerChain::new(self.transformers.clone())
  }
}

impl Default for TransformerRegistry {
  fn default() -> Self {
    Self::empty()
  }
}

impl fmt::Debug for TransformerRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}

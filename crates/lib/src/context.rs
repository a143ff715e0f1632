//! The per-invocation context handed to every transformer.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::artifact::{ArtifactManager, VariantArtifacts};
use crate::execute::WorkerPool;

/// Build configuration lookup delegated to the host.
pub trait PropertySource: Send + Sync {
  fn property(&self, name: &str) -> Option<String>;
}

impl PropertySource for BTreeMap<String, String> {
  fn property(&self, name: &str) -> Option<String> {
    self.get(name).cloned()
  }
}

impl PropertySource for HashMap<String, String> {
  fn property(&self, name: &str) -> Option<String> {
    self.get(name).cloned()
  }
}

/// Read-only configuration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
  /// Invocation name, typically the build variant.
  pub name: String,
  pub project_dir: PathBuf,
  pub build_dir: PathBuf,
  /// Private scratch directory, created before any transformer hook runs.
  pub temporary_dir: PathBuf,
  pub compile_classpath: Vec<PathBuf>,
  pub runtime_classpath: Vec<PathBuf>,
}

impl ContextConfig {
  /// Conventional layout: `<project>/build` and `<project>/build/tmp/transform/<name>`.
  pub fn new(name: impl Into<String>, project_dir: impl Into<PathBuf>) -> Self {
    let name = name.into();
    let project_dir = project_dir.into();
    let build_dir = project_dir.join("build");
    let temporary_dir = build_dir.join("tmp").join("transform").join(&name);
    Self {
      name,
      project_dir,
      build_dir,
      temporary_dir,
      compile_classpath: Vec::new(),
      runtime_classpath: Vec::new(),
    }
  }
}

/// What transformers see of the invocation.
///
/// Shared by reference across all concurrent unit tasks; nothing in it
/// changes during the transform phase.
#[derive(Clone)]
pub struct TransformContext {
  config: ContextConfig,
  properties: Arc<dyn PropertySource>,
  artifacts: ArtifactManager,
  pool: WorkerPool,
}

impl TransformContext {
  pub fn new(config: ContextConfig, pool: WorkerPool) -> Self {
    Self {
      config,
      properties: Arc::new(BTreeMap::<String, String>::new()),
      artifacts: ArtifactManager::default(),
      pool,
    }
  }

  pub fn with_properties(mut self, properties: impl PropertySource + 'static) -> Self {
    self.properties = Arc::new(properties);
    self
  }

  pub fn with_artifacts(mut self, variant: impl VariantArtifacts + 'static) -> Self {
    self.artifacts = ArtifactManager::new(variant);
    self
  }

  pub fn name(&self) -> &str {
    &self.config.name
  }

  pub fn project_dir(&self) -> &Path {
    &self.config.project_dir
  }

  pub fn build_dir(&self) -> &Path {
    &self.config.build_dir
  }

  pub fn temporary_dir(&self) -> &Path {
    &self.config.temporary_dir
  }

  pub fn compile_classpath(&self) -> &[PathBuf] {
    &self.config.compile_classpath
  }

  pub fn runtime_classpath(&self) -> &[PathBuf] {
    &self.config.runtime_classpath
  }

  pub fn config(&self) -> &ContextConfig {
    &self.config
  }

  /// The shared worker pool, for transformers that fan out work of their own.
  pub fn pool(&self) -> &WorkerPool {
    &self.pool
  }

  pub fn artifacts(&self) -> &ArtifactManager {
    &self.artifacts
  }

  pub fn has_property(&self, name: &str) -> bool {
    self.properties.property(name).is_some()
  }

  pub fn get_property(&self, name: &str) -> Option<String> {
    self.properties.property(name)
  }

  /// Parses a property; absent and unparsable values both yield `None`.
  pub fn property_as<T: FromStr>(&self, name: &str) -> Option<T> {
    self.get_property(name).and_then(|v| v.trim().parse().ok())
  }
}

impl fmt::Debug for TransformContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TransformContext")
      .field("config", &self.config)
      .field("threads", &self.pool.threads())
      .finish_non_exhaustive()
  }
}

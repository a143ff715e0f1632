//! Host description loaded from JSON.
//!
//! A manifest tells the engine everything the build host would otherwise
//! provide: the inputs and their change status, the project layout,
//! classpaths, build properties and variant artifact paths.
//!
//! ```json
//! {
//!   "name": "debug",
//!   "project_dir": ".",
//!   "output_dir": "build/intermediates/transforms/debug",
//!   "incremental": true,
//!   "properties": { "weave.enabled": "true" },
//!   "inputs": [
//!     {
//!       "directories": [
//!         { "name": "classes", "path": "build/classes", "changed_files": { "a/A.class": "changed" } }
//!       ],
//!       "jars": [{ "name": "okio", "path": "libs/okio.jar", "status": "unchanged" }]
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the directory holding the manifest.
//! Changed-file keys stay relative to their unit root.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::artifact::{ArtifactKind, VariantArtifacts};
use crate::context::{ContextConfig, TransformContext};
use crate::execute::WorkerPool;
use crate::input::TransformInput;
use crate::invocation::{TransformInvocation, TransformMode};
use crate::output::DirectoryOutputProvider;
use crate::transform::TransformerRegistry;

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {}: {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse manifest {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

/// Variant artifact paths provided by the host, one set per accessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
  pub all_classes: BTreeSet<PathBuf>,
  pub application_package: BTreeSet<PathBuf>,
  pub compiled_classes: BTreeSet<PathBuf>,
  pub merged_assets: BTreeSet<PathBuf>,
  pub merged_resources: BTreeSet<PathBuf>,
  pub merged_manifests: BTreeSet<PathBuf>,
  pub processed_resources: BTreeSet<PathBuf>,
  pub symbol_list: BTreeSet<PathBuf>,
  pub symbol_list_with_package_name: BTreeSet<PathBuf>,
}

impl ArtifactPaths {
  fn sets_mut(&mut self) -> [&mut BTreeSet<PathBuf>; 9] {
    [
      &mut self.all_classes,
      &mut self.application_package,
      &mut self.compiled_classes,
      &mut self.merged_assets,
      &mut self.merged_resources,
      &mut self.merged_manifests,
      &mut self.processed_resources,
      &mut self.symbol_list,
      &mut self.symbol_list_with_package_name,
    ]
  }
}

/// `VariantArtifacts` backed by a manifest.
///
/// Runtime artifacts are the runtime classpath entries with the requested
/// extension.
#[derive(Debug, Clone, Default)]
pub struct HostArtifacts {
  paths: ArtifactPaths,
  runtime_classpath: Vec<PathBuf>,
}

impl HostArtifacts {
  pub fn new(paths: ArtifactPaths, runtime_classpath: Vec<PathBuf>) -> Self {
    Self {
      paths,
      runtime_classpath,
    }
  }
}

impl VariantArtifacts for HostArtifacts {
  fn runtime_artifacts(&self, kind: ArtifactKind) -> BTreeSet<PathBuf> {
    self
      .runtime_classpath
      .iter()
      .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case(kind.extension())))
      .cloned()
      .collect()
  }

  fn all_classes(&self) -> BTreeSet<PathBuf> {
    self.paths.all_classes.clone()
  }

  fn application_package(&self) -> BTreeSet<PathBuf> {
    self.paths.application_package.clone()
  }

  fn compiled_classes(&self) -> BTreeSet<PathBuf> {
    self.paths.compiled_classes.clone()
  }

  fn merged_assets(&self) -> BTreeSet<PathBuf> {
    self.paths.merged_assets.clone()
  }

  fn merged_resources(&self) -> BTreeSet<PathBuf> {
    self.paths.merged_resources.clone()
  }

  fn merged_manifests(&self) -> BTreeSet<PathBuf> {
    self.paths.merged_manifests.clone()
  }

  fn processed_resources(&self) -> BTreeSet<PathBuf> {
    self.paths.processed_resources.clone()
  }

  fn symbol_list(&self) -> BTreeSet<PathBuf> {
    self.paths.symbol_list.clone()
  }

  fn symbol_list_with_package_name(&self) -> BTreeSet<PathBuf> {
    self.paths.symbol_list_with_package_name.clone()
  }
}

/// Everything the build host hands to one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
  pub name: String,
  #[serde(default = "default_project_dir")]
  pub project_dir: PathBuf,
  /// Defaults to `<project_dir>/build`.
  #[serde(default)]
  pub build_dir: Option<PathBuf>,
  /// Defaults to `<build_dir>/tmp/transform/<name>`.
  #[serde(default)]
  pub temporary_dir: Option<PathBuf>,
  pub output_dir: PathBuf,
  #[serde(default)]
  pub incremental: bool,
  #[serde(default)]
  pub compile_classpath: Vec<PathBuf>,
  #[serde(default)]
  pub runtime_classpath: Vec<PathBuf>,
  #[serde(default)]
  pub properties: BTreeMap<String, String>,
  #[serde(default)]
  pub artifacts: ArtifactPaths,
  #[serde(default)]
  pub inputs: Vec<TransformInput>,
  #[serde(default)]
  pub referenced_inputs: Vec<TransformInput>,
}

fn default_project_dir() -> PathBuf {
  PathBuf::from(".")
}

impl HostManifest {
  /// Reads and parses a manifest, resolving relative paths against its directory.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let manifest: HostManifest = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    let base = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    debug!(path = %path.display(), base = %base.display(), "loaded manifest");
    Ok(manifest.resolve_against(&base))
  }

  /// Makes every relative path absolute with respect to `base`.
  pub fn resolve_against(mut self, base: &Path) -> Self {
    let resolve = |p: &mut PathBuf| {
      if p.is_relative() {
        *p = base.join(&*p);
      }
    };

    resolve(&mut self.project_dir);
    resolve(&mut self.output_dir);
    if let Some(dir) = self.build_dir.as_mut() {
      resolve(dir);
    }
    if let Some(dir) = self.temporary_dir.as_mut() {
      resolve(dir);
    }
    self.compile_classpath.iter_mut().for_each(resolve);
    self.runtime_classpath.iter_mut().for_each(resolve);

    for set in self.artifacts.sets_mut() {
      *set = std::mem::take(set)
        .into_iter()
        .map(|mut p| {
          resolve(&mut p);
          p
        })
        .collect();
    }

    for input in self.inputs.iter_mut().chain(self.referenced_inputs.iter_mut()) {
      for unit in &mut input.directories {
        resolve(&mut unit.path);
      }
      for unit in &mut input.jars {
        resolve(&mut unit.path);
      }
    }
    self
  }

  pub fn mode(&self) -> TransformMode {
    TransformMode::from_incremental(self.incremental)
  }

  pub fn context_config(&self) -> ContextConfig {
    let mut config = ContextConfig::new(&self.name, &self.project_dir);
    if let Some(build_dir) = &self.build_dir {
      config.build_dir = build_dir.clone();
      config.temporary_dir = build_dir.join("tmp").join("transform").join(&self.name);
    }
    if let Some(temporary_dir) = &self.temporary_dir {
      config.temporary_dir = temporary_dir.clone();
    }
    config.compile_classpath = self.compile_classpath.clone();
    config.runtime_classpath = self.runtime_classpath.clone();
    config
  }

  pub fn output_provider(&self) -> DirectoryOutputProvider {
    DirectoryOutputProvider::new(&self.output_dir)
  }

  pub fn context(&self, pool: WorkerPool) -> TransformContext {
    TransformContext::new(self.context_config(), pool)
      .with_properties(self.properties.clone())
      .with_artifacts(HostArtifacts::new(self.artifacts.clone(), self.runtime_classpath.clone()))
  }

  /// Builds a ready-to-run invocation.
  pub fn into_invocation(self, registry: TransformerRegistry, pool: WorkerPool) -> TransformInvocation {
    let context = self.context(pool);
    let outputs = self.output_provider();
    let mode = self.mode();
    TransformInvocation::new(context, registry, outputs, mode)
      .with_inputs(self.inputs)
      .with_referenced_inputs(self.referenced_inputs)
  }
}

//! Symbolic artifact lookup.
//!
//! Transformers ask for build-produced file sets by `ArtifactType`; the
//! `ArtifactManager` routes each type to exactly one accessor of the host's
//! `VariantArtifacts`. No I/O happens here.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of build-produced files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactType {
  /// Library archives (`.aar`) on the runtime classpath.
  LibraryArchives,
  /// Every class directory and jar feeding the transform.
  AllClasses,
  /// The packaged application.
  ApplicationPackage,
  /// Plain jars on the runtime classpath.
  ClasspathJars,
  /// Output of the source compiler.
  CompiledClasses,
  MergedAssets,
  MergedResources,
  MergedManifests,
  ProcessedResources,
  SymbolList,
  SymbolListWithPackageName,
}

impl ArtifactType {
  pub const ALL: [ArtifactType; 11] = [
    ArtifactType::LibraryArchives,
    ArtifactType::AllClasses,
    ArtifactType::ApplicationPackage,
    ArtifactType::ClasspathJars,
    ArtifactType::CompiledClasses,
    ArtifactType::MergedAssets,
    ArtifactType::MergedResources,
    ArtifactType::MergedManifests,
    ArtifactType::ProcessedResources,
    ArtifactType::SymbolList,
    ArtifactType::SymbolListWithPackageName,
  ];

  pub fn key(self) -> &'static str {
    match self {
      ArtifactType::LibraryArchives => "library-archives",
      ArtifactType::AllClasses => "all-classes",
      ArtifactType::ApplicationPackage => "application-package",
      ArtifactType::ClasspathJars => "classpath-jars",
      ArtifactType::CompiledClasses => "compiled-classes",
      ArtifactType::MergedAssets => "merged-assets",
      ArtifactType::MergedResources => "merged-resources",
      ArtifactType::MergedManifests => "merged-manifests",
      ArtifactType::ProcessedResources => "processed-resources",
      ArtifactType::SymbolList => "symbol-list",
      ArtifactType::SymbolListWithPackageName => "symbol-list-with-package-name",
    }
  }
}

impl fmt::Display for ArtifactType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

impl FromStr for ArtifactType {
  type Err = ArtifactError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ArtifactType::ALL
      .into_iter()
      .find(|t| t.key() == s)
      .ok_or_else(|| ArtifactError::UnknownType(s.to_string()))
  }
}

/// Errors from artifact lookup.
#[derive(Debug, Error)]
pub enum ArtifactError {
  /// The key is not an `ArtifactType`. The plugin and the artifact table disagree.
  #[error("unknown artifact type: {0}")]
  UnknownType(String),
}

/// Kind of runtime classpath artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
  Aar,
  Jar,
}

impl ArtifactKind {
  pub fn extension(self) -> &'static str {
    match self {
      ArtifactKind::Aar => "aar",
      ArtifactKind::Jar => "jar",
    }
  }
}

/// Host accessors for variant-derived file sets.
///
/// Accessors default to an empty set.
pub trait VariantArtifacts: Send + Sync {
  fn runtime_artifacts(&self, _kind: ArtifactKind) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn all_classes(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn application_package(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn compiled_classes(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn merged_assets(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn merged_resources(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn merged_manifests(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn processed_resources(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn symbol_list(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }

  fn symbol_list_with_package_name(&self) -> BTreeSet<PathBuf> {
    BTreeSet::new()
  }
}

/// A host with no variant artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

impl VariantArtifacts for NoArtifacts {}

/// Typed routing table from `ArtifactType` to host accessors.
#[derive(Clone)]
pub struct ArtifactManager {
  variant: Arc<dyn VariantArtifacts>,
}

impl ArtifactManager {
  pub fn new(variant: impl VariantArtifacts + 'static) -> Self {
    Self {
      variant: Arc::new(variant),
    }
  }

  pub fn resolve(&self, artifact: ArtifactType) -> BTreeSet<PathBuf> {
    let variant = self.variant.as_ref();
    match artifact {
      ArtifactType::LibraryArchives => variant.runtime_artifacts(ArtifactKind::Aar),
      ArtifactType::AllClasses => variant.all_classes(),
      ArtifactType::ApplicationPackage => variant.application_package(),
      ArtifactType::ClasspathJars => variant.runtime_artifacts(ArtifactKind::Jar),
      ArtifactType::CompiledClasses => variant.compiled_classes(),
      ArtifactType::MergedAssets => variant.merged_assets(),
      ArtifactType::MergedResources => variant.merged_resources(),
      ArtifactType::MergedManifests => variant.merged_manifests(),
      ArtifactType::ProcessedResources => variant.processed_resources(),
      ArtifactType::SymbolList => variant.symbol_list(),
      ArtifactType::SymbolListWithPackageName => variant.symbol_list_with_package_name(),
    }
  }

  /// Resolves a string key as used by plugins.
  pub fn get(&self, key: &str) -> Result<BTreeSet<PathBuf>, ArtifactError> {
    Ok(self.resolve(key.parse()?))
  }
}

impl Default for ArtifactManager {
  fn default() -> Self {
    Self::new(NoArtifacts)
  }
}

impl fmt::Debug for ArtifactManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ArtifactManager").finish_non_exhaustive()
  }
}

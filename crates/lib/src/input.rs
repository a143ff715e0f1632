//! Transform inputs: directory units, jar units and their change status.
//!
//! An input is a logical group of build output. Each unit in it is either a
//! directory tree of class files or a single jar archive. In incremental
//! mode jar units carry one `Status` for the whole archive while directory
//! units carry a status per contained file.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::output::{Format, OutputProvider};

/// Change classification of a unit or a file since the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Added,
  Changed,
  Removed,
  #[serde(alias = "notchanged")]
  Unchanged,
}

impl Status {
  /// Whether the previous destination must be removed first.
  pub fn requires_delete(self) -> bool {
    matches!(self, Status::Removed | Status::Changed)
  }

  /// Whether the source must be run through the chain and written.
  pub fn requires_transform(self) -> bool {
    matches!(self, Status::Added | Status::Changed)
  }
}

impl fmt::Display for Status {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Status::Added => "added",
      Status::Changed => "changed",
      Status::Removed => "removed",
      Status::Unchanged => "unchanged",
    };
    f.write_str(s)
  }
}

/// Kind of content a unit holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
  Classes,
  Resources,
}

impl ContentType {
  pub fn bit(self) -> u32 {
    match self {
      ContentType::Classes => 0x01,
      ContentType::Resources => 0x02,
    }
  }
}

/// Where a unit comes from relative to the module being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
  Project,
  SubProjects,
  ExternalLibraries,
  TestedCode,
  ProvidedOnly,
}

impl Scope {
  pub fn bit(self) -> u32 {
    match self {
      Scope::Project => 0x01,
      Scope::SubProjects => 0x04,
      Scope::ExternalLibraries => 0x10,
      Scope::TestedCode => 0x20,
      Scope::ProvidedOnly => 0x40,
    }
  }
}

pub type ContentTypes = BTreeSet<ContentType>;
pub type Scopes = BTreeSet<Scope>;

fn default_content_types() -> ContentTypes {
  BTreeSet::from([ContentType::Classes])
}

fn default_scopes() -> Scopes {
  BTreeSet::from([Scope::Project])
}

fn default_jar_status() -> Status {
  Status::Added
}

/// A directory tree of class files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUnit {
  pub name: String,
  pub path: PathBuf,
  #[serde(default = "default_content_types")]
  pub content_types: ContentTypes,
  #[serde(default = "default_scopes")]
  pub scopes: Scopes,
  /// Per-file status for incremental runs.
  ///
  /// `Some(empty)` means nothing changed. `None` means the host has no
  /// record for this unit and every file is treated as added.
  #[serde(default)]
  pub changed_files: Option<BTreeMap<PathBuf, Status>>,
}

impl DirectoryUnit {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      content_types: default_content_types(),
      scopes: default_scopes(),
      changed_files: None,
    }
  }

  pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
    self.scopes = scopes.into_iter().collect();
    self
  }

  pub fn with_content_types(mut self, content_types: impl IntoIterator<Item = ContentType>) -> Self {
    self.content_types = content_types.into_iter().collect();
    self
  }

  /// Records `file` with `status`; relative paths are taken relative to the unit root.
  pub fn with_changed_file(mut self, file: impl Into<PathBuf>, status: Status) -> Self {
    self.changed_files.get_or_insert_with(BTreeMap::new).insert(file.into(), status);
    self
  }

  /// Marks the unit as having a change record with no entries.
  pub fn with_no_changes(mut self) -> Self {
    self.changed_files = Some(BTreeMap::new());
    self
  }

  /// Path of a changed file key relative to the unit root.
  ///
  /// Keys may be absolute or relative to the root. `None` when the key does
  /// not name a file strictly below the root, including keys that climb out
  /// through `..`.
  pub fn relative_file(&self, file: &Path) -> Option<PathBuf> {
    let relative = if file.is_absolute() {
      file.strip_prefix(&self.path).ok()?
    } else {
      file
    };
    let mut clean = PathBuf::new();
    for component in relative.components() {
      match component {
        Component::Normal(part) => clean.push(part),
        Component::CurDir => {}
        Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
      }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
  }
}

/// A single jar archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarUnit {
  pub name: String,
  pub path: PathBuf,
  #[serde(default = "default_content_types")]
  pub content_types: ContentTypes,
  #[serde(default = "default_scopes")]
  pub scopes: Scopes,
  #[serde(default = "default_jar_status")]
  pub status: Status,
}

impl JarUnit {
  pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      path: path.into(),
      content_types: default_content_types(),
      scopes: default_scopes(),
      status: default_jar_status(),
    }
  }

  pub fn with_status(mut self, status: Status) -> Self {
    self.status = status;
    self
  }

  pub fn with_scopes(mut self, scopes: impl IntoIterator<Item = Scope>) -> Self {
    self.scopes = scopes.into_iter().collect();
    self
  }
}

/// A logical group of directory and jar units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformInput {
  #[serde(default)]
  pub directories: Vec<DirectoryUnit>,
  #[serde(default)]
  pub jars: Vec<JarUnit>,
}

impl TransformInput {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_directory(mut self, unit: DirectoryUnit) -> Self {
    self.directories.push(unit);
    self
  }

  pub fn with_jar(mut self, unit: JarUnit) -> Self {
    self.jars.push(unit);
    self
  }

  /// All units, directories first, in declaration order.
  pub fn units(&self) -> impl Iterator<Item = Unit<'_>> {
    self
      .directories
      .iter()
      .map(Unit::Directory)
      .chain(self.jars.iter().map(Unit::Jar))
  }

  pub fn unit_count(&self) -> usize {
    self.directories.len() + self.jars.len()
  }
}

/// Borrowed view over either kind of unit.
#[derive(Debug, Clone, Copy)]
pub enum Unit<'a> {
  Directory(&'a DirectoryUnit),
  Jar(&'a JarUnit),
}

impl<'a> Unit<'a> {
  pub fn name(&self) -> &'a str {
    match self {
      Unit::Directory(d) => &d.name,
      Unit::Jar(j) => &j.name,
    }
  }

  pub fn path(&self) -> &'a Path {
    match self {
      Unit::Directory(d) => &d.path,
      Unit::Jar(j) => &j.path,
    }
  }

  pub fn content_types(&self) -> &'a ContentTypes {
    match self {
      Unit::Directory(d) => &d.content_types,
      Unit::Jar(j) => &j.content_types,
    }
  }

  pub fn scopes(&self) -> &'a Scopes {
    match self {
      Unit::Directory(d) => &d.scopes,
      Unit::Jar(j) => &j.scopes,
    }
  }

  pub fn format(&self) -> Format {
    match self {
      Unit::Directory(_) => Format::Directory,
      Unit::Jar(_) => Format::Jar,
    }
  }

  /// Destination of this unit as allocated by `outputs`.
  pub fn location(&self, outputs: &dyn OutputProvider) -> PathBuf {
    outputs.content_location(self.name(), self.content_types(), self.scopes(), self.format())
  }
}

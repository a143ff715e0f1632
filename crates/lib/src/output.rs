//! Destination allocation.
//!
//! Every unit maps to one destination computed from its name, content
//! types, scopes and output format. Full and incremental runs use the same
//! computation, so a unit always lands in the same place.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::{ContentTypes, Scopes};

/// Shape of a unit's destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
  /// A directory tree mirroring the source unit.
  Directory,
  /// A single jar archive.
  Jar,
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Format::Directory => f.write_str("directory"),
      Format::Jar => f.write_str("jar"),
    }
  }
}

/// Host-provided destination allocator.
pub trait OutputProvider: Send + Sync {
  /// Destination for the unit identified by the arguments.
  ///
  /// Must be deterministic, and distinct argument tuples must map to
  /// distinct paths.
  fn content_location(&self, name: &str, content_types: &ContentTypes, scopes: &Scopes, format: Format) -> PathBuf;

  /// Removes every previously written destination.
  fn delete_all(&self) -> io::Result<()>;
}

/// Allocates destinations below a single root directory.
///
/// Layout:
/// ```text
/// <root>/
/// ├── folders/<types>/<scopes>/<name>/      # directory units
/// └── jars/<types>/<scopes>/<name>.jar      # jar units
/// ```
/// `<types>` and `<scopes>` are the hex bit masks of the respective sets.
#[derive(Debug, Clone)]
pub struct DirectoryOutputProvider {
  root: PathBuf,
}

impl DirectoryOutputProvider {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

impl OutputProvider for DirectoryOutputProvider {
  fn content_location(&self, name: &str, content_types: &ContentTypes, scopes: &Scopes, format: Format) -> PathBuf {
    let types = content_types.iter().fold(0u32, |acc, t| acc | t.bit());
    let scopes = scopes.iter().fold(0u32, |acc, s| acc | s.bit());

    let (folder, file_name) = match format {
      Format::Directory => ("folders", sanitize_name(name)),
      Format::Jar => {
        let mut file_name = sanitize_name(name);
        if !file_name.ends_with(".jar") {
          file_name.push_str(".jar");
        }
        ("jars", file_name)
      }
    };

    self
      .root
      .join(folder)
      .join(format!("{types:x}"))
      .join(format!("{scopes:x}"))
      .join(file_name)
  }

  fn delete_all(&self) -> io::Result<()> {
    match fs::remove_dir_all(&self.root) {
      Ok(()) => {
        debug!(root = %self.root.display(), "cleared output root");
        Ok(())
      }
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e),
    }
  }
}

/// Flattens a unit name into a single path component.
fn sanitize_name(name: &str) -> String {
  let sanitized: String = name
    .chars()
    .map(|c| match c {
      '/' | '\\' | ':' => '_',
      c => c,
    })
    .collect();

  match sanitized.as_str() {
    "" | "." | ".." => format!("unit{}", sanitized.replace('.', "_")),
    _ => sanitized,
  }
}

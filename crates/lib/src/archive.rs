//! Byte pipelines for single files, directory trees and jar archives.
//!
//! Only `.class` payloads go through the chain; everything else is copied
//! as-is. Each destination file or archive is staged in a temporary sibling
//! and moved into place once the chain has succeeded for all of it.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::context::TransformContext;
use crate::execute::ExecuteError;
use crate::transform::TransformerChain;
use crate::util::fs::{persist, sibling_temp, write_atomic};

const CLASS_SUFFIX: &str = ".class";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_ENTRY_PREALLOC: u64 = 16 * 1024 * 1024;

/// Whether a file or entry name denotes a class file.
pub fn is_class_file(name: &str) -> bool {
  name.ends_with(CLASS_SUFFIX)
}

/// Lists every regular file below `root`, sorted by path.
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, ExecuteError> {
  let mut files = Vec::new();
  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|source| ExecuteError::Walk {
      root: root.to_path_buf(),
      source,
    })?;
    if entry.file_type().is_file() {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

/// Buffer for an entry whose header claims `declared` bytes. The header is
/// untrusted, so the reservation is capped and the vector grows on read.
fn entry_buffer(declared: u64) -> Vec<u8> {
  Vec::with_capacity(declared.min(MAX_ENTRY_PREALLOC) as usize)
}

fn apply_to_entry(
  chain: &TransformerChain,
  ctx: &TransformContext,
  name: &str,
  location: impl FnOnce() -> String,
  bytes: Vec<u8>,
) -> Result<Vec<u8>, ExecuteError> {
  if !is_class_file(name) {
    return Ok(bytes);
  }
  chain.apply(ctx, bytes).map_err(|source| ExecuteError::Transform {
    location: location(),
    source,
  })
}

/// Transforms one file from `source` into `dest`.
pub fn transform_file(
  chain: &TransformerChain,
  ctx: &TransformContext,
  source: &Path,
  dest: &Path,
) -> Result<(), ExecuteError> {
  let bytes = fs::read(source).map_err(ExecuteError::io(source))?;
  let name = source.file_name().and_then(|n| n.to_str()).unwrap_or_default();
  let bytes = apply_to_entry(chain, ctx, name, || source.display().to_string(), bytes)?;
  write_atomic(dest, &bytes).map_err(ExecuteError::io(dest))
}

/// Transforms every file of the tree at `source_root` into the same
/// relative location under `dest_root`. Returns the number of files written.
pub fn transform_directory(
  chain: &TransformerChain,
  ctx: &TransformContext,
  source_root: &Path,
  dest_root: &Path,
) -> Result<usize, ExecuteError> {
  let files = list_files(source_root)?;

  files.par_iter().try_for_each(|file| {
    let relative = file.strip_prefix(source_root).map_err(|_| ExecuteError::OutsideUnitRoot {
      file: file.clone(),
      root: source_root.to_path_buf(),
    })?;
    transform_file(chain, ctx, file, &dest_root.join(relative))
  })?;

  debug!(source = %source_root.display(), files = files.len(), "directory transformed");
  Ok(files.len())
}

/// Rewrites the jar at `source` into `dest`, transforming class entries.
///
/// Entry order, names, unix modes and timestamps are kept so that the
/// same input always yields the same archive bytes. Returns the number of
/// entries written.
pub fn transform_jar(
  chain: &TransformerChain,
  ctx: &TransformContext,
  source: &Path,
  dest: &Path,
) -> Result<usize, ExecuteError> {
  let file = File::open(source).map_err(ExecuteError::io(source))?;
  let mut archive = ZipArchive::new(BufReader::new(file)).map_err(ExecuteError::archive(source))?;

  let temp = sibling_temp(dest).map_err(ExecuteError::io(dest))?;
  let mut writer = ZipWriter::new(BufWriter::new(temp));

  for index in 0..archive.len() {
    let mut entry = archive.by_index(index).map_err(ExecuteError::archive(source))?;
    let name = entry.name().to_string();

    let compression = match entry.compression() {
      CompressionMethod::Stored => CompressionMethod::Stored,
      _ => CompressionMethod::Deflated,
    };
    let mut options = SimpleFileOptions::default()
      .compression_method(compression)
      .last_modified_time(entry.last_modified().unwrap_or_default())
      .large_file(entry.size() > u64::from(u32::MAX));
    if let Some(mode) = entry.unix_mode() {
      options = options.unix_permissions(mode);
    }

    if entry.is_dir() {
      writer.add_directory(name, options).map_err(ExecuteError::archive(dest))?;
      continue;
    }

    let mut bytes = entry_buffer(entry.size());
    entry.read_to_end(&mut bytes).map_err(ExecuteError::io(source))?;
    drop(entry);

    let bytes = apply_to_entry(chain, ctx, &name, || format!("{}!/{}", source.display(), name), bytes)?;

    writer.start_file(name, options).map_err(ExecuteError::archive(dest))?;
    writer.write_all(&bytes).map_err(ExecuteError::io(dest))?;
  }

  let entries = archive.len();
  let buffered = writer.finish().map_err(ExecuteError::archive(dest))?;
  let temp = buffered.into_inner().map_err(|e| ExecuteError::Io {
    path: dest.to_path_buf(),
    source: e.into_error(),
  })?;
  persist(temp, dest).map_err(ExecuteError::io(dest))?;

  debug!(source = %source.display(), dest = %dest.display(), entries, "jar transformed");
  Ok(entries)
}

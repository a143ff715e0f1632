//! Atomic writes and tolerant deletes.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Creates a temporary file next to `dest`, creating parent directories.
///
/// The file is removed on drop unless it is persisted with [`persist`].
pub fn sibling_temp(dest: &Path) -> io::Result<NamedTempFile> {
  let parent = dest.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
  fs::create_dir_all(&parent)?;
  NamedTempFile::new_in(&parent)
}

/// Moves a finished temporary file onto `dest`, replacing what was there.
pub fn persist(temp: NamedTempFile, dest: &Path) -> io::Result<()> {
  temp.persist(dest).map(|_| ()).map_err(|e| e.error)
}

/// Writes `bytes` to `dest` so that readers see either the old or the new content.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
  let mut temp = sibling_temp(dest)?;
  temp.write_all(bytes)?;
  temp.flush()?;
  persist(temp, dest)
}

/// Removes a file or directory tree. Returns `false` if nothing was there.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
  let metadata = match fs::symlink_metadata(path) {
    Ok(m) => m,
    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
    Err(e) => return Err(e),
  };

  let removed = if metadata.is_dir() {
    fs::remove_dir_all(path)
  } else {
    fs::remove_file(path)
  };

  match removed {
    Ok(()) => Ok(true),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
  }
}

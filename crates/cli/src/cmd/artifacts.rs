//! Implementation of the `weave artifacts` command.

use std::path::Path;

use anyhow::{Context, Result};

use classweave_lib::execute::WorkerPool;
use classweave_lib::manifest::HostManifest;

use crate::output::{OutputFormat, print_error, print_info, print_json};

pub fn cmd_artifacts(path: &Path, key: &str, format: OutputFormat) -> Result<()> {
  let manifest =
    HostManifest::load(path).with_context(|| format!("Failed to load manifest: {}", path.display()))?;
  let pool = WorkerPool::new(1).context("Failed to start worker pool")?;
  let ctx = manifest.context(pool);

  let files = match ctx.artifacts().get(key) {
    Ok(files) => files,
    Err(e) => {
      print_error(&e.to_string());
      return Err(e.into());
    }
  };

  if format.is_json() {
    print_json(&serde_json::json!({ "type": key, "files": files }))?;
  } else if files.is_empty() {
    print_info(&format!("No files for artifact type '{}'", key));
  } else {
    for file in &files {
      println!("{}", file.display());
    }
  }

  Ok(())
}

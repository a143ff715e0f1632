//! Implementation of the `weave transform` command.
//!
//! Loads a host manifest, applies command line overrides and runs one
//! invocation through its three phases.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use classweave_lib::execute::{ExecuteConfig, WorkerPool};
use classweave_lib::manifest::HostManifest;
use classweave_lib::transform::TransformerRegistry;

use crate::output::{OutputFormat, format_duration, print_error, print_json, print_stat, print_success};
use crate::verify::MagicVerifier;

/// Command line overrides for one transform run.
pub struct TransformOptions {
  /// `Some` when `--incremental` or `--full` was given.
  pub incremental: Option<bool>,
  pub jobs: Option<usize>,
  pub properties: Vec<(String, String)>,
  pub verify_magic: bool,
  pub format: OutputFormat,
}

pub fn cmd_transform(path: &Path, options: TransformOptions) -> Result<()> {
  let mut manifest =
    HostManifest::load(path).with_context(|| format!("Failed to load manifest: {}", path.display()))?;

  if let Some(incremental) = options.incremental {
    manifest.incremental = incremental;
  }
  manifest.properties.extend(options.properties);

  let config = match options.jobs {
    Some(parallelism) => ExecuteConfig { parallelism },
    None => ExecuteConfig::default(),
  };
  let pool = WorkerPool::from_config(&config).context("Failed to start worker pool")?;

  let mut registry = TransformerRegistry::builder();
  if options.verify_magic {
    registry = registry.register(MagicVerifier);
  }
  let registry = registry.build();
  info!(transformers = ?registry.names(), "registered transformers");

  let name = manifest.name.clone();
  let mode = manifest.mode();
  let output_dir = manifest.output_dir.clone();
  let mut invocation = manifest.into_invocation(registry, pool);

  let started = Instant::now();
  let summary = match invocation.run() {
    Ok(summary) => summary,
    Err(e) => {
      print_error(&format!("Transform of '{}' failed: {}", name, e));
      return Err(e.into());
    }
  };
  let elapsed = started.elapsed();

  if options.format.is_json() {
    let json = serde_json::json!({
      "name": name,
      "mode": mode.to_string(),
      "output_dir": output_dir,
      "summary": summary,
      "elapsed_ms": elapsed.as_millis() as u64,
    });
    print_json(&json)?;
  } else {
    print_success(&format!(
      "{} transform of '{}' finished in {}",
      mode,
      name,
      format_duration(elapsed)
    ));
    print_stat("Units processed", &summary.units_processed.to_string());
    print_stat("Units skipped", &summary.units_skipped.to_string());
    print_stat("Files written", &summary.files_written.to_string());
    print_stat("Files deleted", &summary.files_deleted.to_string());
    if summary.files_skipped > 0 {
      print_stat("Files unchanged", &summary.files_skipped.to_string());
    }
    print_stat("Output", &output_dir.display().to_string());
  }

  Ok(())
}

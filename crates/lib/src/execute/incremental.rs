//! Incremental transform: only what changed since the previous run.
//!
//! Jar units are atomic: a changed jar is deleted and rewritten as a whole.
//! Directory units are not: each reported file is handled on its own, and
//! files that were not reported are never touched.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{debug, info};

use super::{ExecuteError, SummaryCounter, TransformSummary, check_disjoint};
use crate::archive::{list_files, transform_file, transform_jar};
use crate::context::TransformContext;
use crate::input::{DirectoryUnit, JarUnit, Status, TransformInput, Unit};
use crate::output::OutputProvider;
use crate::transform::TransformerChain;
use crate::util::fs::remove_if_exists;

/// Applies the recorded changes of every unit to the destination tree.
///
/// Deletes never fail on an already missing destination.
pub fn incremental_transform(
  inputs: &[TransformInput],
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
) -> Result<TransformSummary, ExecuteError> {
  let units: usize = inputs.iter().map(TransformInput::unit_count).sum();
  info!(inputs = inputs.len(), units, transformers = chain.len(), "starting incremental transform");

  check_disjoint(inputs, outputs)?;

  let counter = SummaryCounter::default();
  ctx.pool().install(|| {
    inputs.par_iter().try_for_each(|input| {
      let (jars, directories) = rayon::join(
        || {
          input
            .jars
            .par_iter()
            .try_for_each(|unit| update_jar_unit(unit, chain, ctx, outputs, &counter))
        },
        || {
          input
            .directories
            .par_iter()
            .try_for_each(|unit| update_directory_unit(unit, chain, ctx, outputs, &counter))
        },
      );
      jars?;
      directories
    })
  })?;

  let summary = counter.finish();
  info!(
    processed = summary.units_processed,
    skipped = summary.units_skipped,
    written = summary.files_written,
    deleted = summary.files_deleted,
    "incremental transform complete"
  );
  Ok(summary)
}

fn update_jar_unit(
  unit: &JarUnit,
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
  counter: &SummaryCounter,
) -> Result<(), ExecuteError> {
  if unit.status == Status::Unchanged {
    debug!(unit = %unit.name, "jar unchanged, skipping");
    counter.unit_skipped();
    return Ok(());
  }

  let dest = Unit::Jar(unit).location(outputs);
  debug!(unit = %unit.name, status = %unit.status, dest = %dest.display(), "updating jar");

  if unit.status.requires_delete() && remove_if_exists(&dest).map_err(ExecuteError::io(&dest))? {
    counter.deleted();
  }

  if unit.status.requires_transform() {
    transform_jar(chain, ctx, &unit.path, &dest)?;
    counter.written(1);
  }

  counter.unit_processed();
  Ok(())
}

fn update_directory_unit(
  unit: &DirectoryUnit,
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
  counter: &SummaryCounter,
) -> Result<(), ExecuteError> {
  let changes: Vec<(PathBuf, Status)> = match &unit.changed_files {
    Some(files) if files.is_empty() => {
      debug!(unit = %unit.name, "directory unchanged, skipping");
      counter.unit_skipped();
      return Ok(());
    }
    Some(files) => files
      .iter()
      .map(|(file, status)| {
        let relative = unit.relative_file(file).ok_or_else(|| ExecuteError::OutsideUnitRoot {
          file: unit.path.join(file),
          root: unit.path.clone(),
        })?;
        Ok((relative, *status))
      })
      .collect::<Result<_, ExecuteError>>()?,
    None => {
      debug!(unit = %unit.name, "no change record, rescanning directory");
      list_files(&unit.path)?
        .into_iter()
        .map(|file| {
          let relative = file.strip_prefix(&unit.path).map_err(|_| ExecuteError::OutsideUnitRoot {
            file: file.clone(),
            root: unit.path.clone(),
          })?;
          Ok((relative.to_path_buf(), Status::Added))
        })
        .collect::<Result<_, ExecuteError>>()?
    }
  };

  let root = Unit::Directory(unit).location(outputs);
  debug!(unit = %unit.name, changes = changes.len(), dest = %root.display(), "updating directory");

  changes.par_iter().try_for_each(|(relative, status)| {
    if *status == Status::Unchanged {
      counter.file_skipped();
      return Ok(());
    }

    let file = unit.path.join(relative);
    let dest = root.join(relative);

    if status.requires_delete() && remove_if_exists(&dest).map_err(ExecuteError::io(&dest))? {
      counter.deleted();
    }

    if status.requires_transform() {
      transform_file(chain, ctx, &file, &dest)?;
      counter.written(1);
    }

    Ok(())
  })?;

  counter.unit_processed();
  Ok(())
}

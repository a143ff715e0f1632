//! Full transform: every unit of every input, status ignored.

use rayon::prelude::*;
use tracing::{debug, info};

use super::{ExecuteError, SummaryCounter, TransformSummary, check_disjoint};
use crate::archive::{transform_directory, transform_jar};
use crate::context::TransformContext;
use crate::input::{DirectoryUnit, JarUnit, TransformInput, Unit};
use crate::output::OutputProvider;
use crate::transform::TransformerChain;

/// Transforms every unit into its destination.
///
/// The output root is cleared first so that nothing from a previous run
/// survives. With unchanged inputs and transformers the result is
/// byte-identical from run to run.
pub fn full_transform(
  inputs: &[TransformInput],
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
) -> Result<TransformSummary, ExecuteError> {
  let units: usize = inputs.iter().map(TransformInput::unit_count).sum();
  info!(inputs = inputs.len(), units, transformers = chain.len(), "starting full transform");

  check_disjoint(inputs, outputs)?;
  outputs.delete_all().map_err(ExecuteError::Clean)?;

  let counter = SummaryCounter::default();
  ctx.pool().install(|| {
    inputs.par_iter().try_for_each(|input| {
      let (directories, jars) = rayon::join(
        || {
          input
            .directories
            .par_iter()
            .try_for_each(|unit| transform_directory_unit(unit, chain, ctx, outputs, &counter))
        },
        || {
          input
            .jars
            .par_iter()
            .try_for_each(|unit| transform_jar_unit(unit, chain, ctx, outputs, &counter))
        },
      );
      directories?;
      jars
    })
  })?;

  let summary = counter.finish();
  info!(
    processed = summary.units_processed,
    written = summary.files_written,
    "full transform complete"
  );
  Ok(summary)
}

fn transform_directory_unit(
  unit: &DirectoryUnit,
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
  counter: &SummaryCounter,
) -> Result<(), ExecuteError> {
  let dest = Unit::Directory(unit).location(outputs);
  debug!(unit = %unit.name, source = %unit.path.display(), dest = %dest.display(), "transforming directory");

  let written = transform_directory(chain, ctx, &unit.path, &dest)?;
  counter.written(written);
  counter.unit_processed();
  Ok(())
}

fn transform_jar_unit(
  unit: &JarUnit,
  chain: &TransformerChain,
  ctx: &TransformContext,
  outputs: &dyn OutputProvider,
  counter: &SummaryCounter,
) -> Result<(), ExecuteError> {
  let dest = Unit::Jar(unit).location(outputs);
  debug!(unit = %unit.name, source = %unit.path.display(), dest = %dest.display(), "transforming jar");

  transform_jar(chain, ctx, &unit.path, &dest)?;
  counter.written(1);
  counter.unit_processed();
  Ok(())
}

//! Implementation of the `weave inspect` command.
//!
//! Shows every unit of a manifest with its change status and the
//! destination it would be written to. Nothing is read or written.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use classweave_lib::execute::check_disjoint;
use classweave_lib::input::{Status, Unit};
use classweave_lib::manifest::HostManifest;

use crate::output::{
  OutputFormat, print_error, print_info, print_json, print_stat, status_symbol, symbols,
};

#[derive(Debug, Serialize)]
struct UnitReport {
  input: usize,
  format: String,
  name: String,
  source: String,
  status: Status,
  /// Reported changed files, `None` for jars and for directories without a record.
  changed_files: Option<usize>,
  destination: String,
}

/// Collapses a unit's change record into one status.
fn unit_status(unit: Unit<'_>) -> (Status, Option<usize>) {
  match unit {
    Unit::Jar(jar) => (jar.status, None),
    Unit::Directory(dir) => match &dir.changed_files {
      None => (Status::Added, None),
      Some(files) => {
        let changed = files.values().filter(|s| **s != Status::Unchanged).count();
        let status = if changed == 0 { Status::Unchanged } else { Status::Changed };
        (status, Some(changed))
      }
    },
  }
}

pub fn cmd_inspect(path: &Path, format: OutputFormat) -> Result<()> {
  let manifest =
    HostManifest::load(path).with_context(|| format!("Failed to load manifest: {}", path.display()))?;
  let outputs = manifest.output_provider();

  let reports: Vec<UnitReport> = manifest
    .inputs
    .iter()
    .enumerate()
    .flat_map(|(index, input)| input.units().map(move |unit| (index, unit)))
    .map(|(index, unit)| {
      let (status, changed_files) = unit_status(unit);
      UnitReport {
        input: index,
        format: unit.format().to_string(),
        name: unit.name().to_string(),
        source: unit.path().display().to_string(),
        status,
        changed_files,
        destination: unit.location(&outputs).display().to_string(),
      }
    })
    .collect();

  let disjoint = check_disjoint(&manifest.inputs, &outputs);

  if format.is_json() {
    let json = serde_json::json!({
      "name": manifest.name,
      "mode": manifest.mode().to_string(),
      "units": reports,
      "referenced_units": manifest.referenced_inputs.iter().map(|i| i.unit_count()).sum::<usize>(),
      "overlap": disjoint.as_ref().err().map(|e| e.to_string()),
    });
    print_json(&json)?;
  } else {
    print_info(&format!("{} ({} mode)", manifest.name, manifest.mode()));
    for report in &reports {
      let files = match report.changed_files {
        Some(n) => format!(" ({} changed file(s))", n),
        None => String::new(),
      };
      println!(
        "  {} [{}] {} {}{} {} {}",
        status_symbol(report.status),
        report.input,
        report.format,
        report.name,
        files,
        symbols::ARROW,
        report.destination
      );
    }
    println!();
    print_stat("Units", &reports.len().to_string());
    let referenced: usize = manifest.referenced_inputs.iter().map(|i| i.unit_count()).sum();
    print_stat("Referenced units", &referenced.to_string());
  }

  if let Err(e) = disjoint {
    print_error(&e.to_string());
    return Err(e.into());
  }
  Ok(())
}

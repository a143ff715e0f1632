mod cmd;
mod output;
mod verify;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{TransformOptions, cmd_artifacts, cmd_inspect, cmd_transform};
use crate::output::OutputFormat;

/// weave - run bytecode transformers over compiled build output
#[derive(Parser)]
#[command(name = "weave")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one transform invocation described by a manifest
  Transform {
    /// Path to the host manifest
    manifest: PathBuf,

    /// Force an incremental run regardless of the manifest
    #[arg(long, conflicts_with = "full")]
    incremental: bool,

    /// Force a full run regardless of the manifest
    #[arg(long)]
    full: bool,

    /// Worker threads (default: available parallelism)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Override a build property (repeatable)
    #[arg(short = 'P', long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    properties: Vec<(String, String)>,

    /// Reject class files that lack the class file magic number
    #[arg(long)]
    verify_magic: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// List every unit with its status and destination
  Inspect {
    /// Path to the host manifest
    manifest: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Print the files of an artifact type
  Artifacts {
    /// Path to the host manifest
    manifest: PathBuf,

    /// Artifact type key, e.g. `classpath-jars`
    artifact: String,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
  match raw.split_once('=') {
    Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
    _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Transform {
      manifest,
      incremental,
      full,
      jobs,
      properties,
      verify_magic,
      format,
    } => cmd_transform(
      &manifest,
      TransformOptions {
        incremental: if incremental {
          Some(true)
        } else if full {
          Some(false)
        } else {
          None
        },
        jobs,
        properties,
        verify_magic,
        format,
      },
    ),
    Commands::Inspect { manifest, format } => cmd_inspect(&manifest, format),
    Commands::Artifacts {
      manifest,
      artifact,
      format,
    } => cmd_artifacts(&manifest, &artifact, format),
  }
}

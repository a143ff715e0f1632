//! CLI output formatting utilities.
//!
//! Colored status lines, unit status symbols and JSON output.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use classweave_lib::input::Status;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
  pub const UNCHANGED: &str = "=";
}

/// Symbol for a unit or file status, colored for stdout.
pub fn status_symbol(status: Status) -> String {
  match status {
    Status::Added => symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
    Status::Changed => symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    Status::Removed => symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
    Status::Unchanged => symbols::UNCHANGED
      .if_supports_color(Stream::Stdout, |s| s.dimmed())
      .to_string(),
  }
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

//! Terminal presentation for scan reports.
//!
//! Text mode prints one status line per action or file followed by an
//! indented item list. JSON mode prints the whole report as one document.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
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
}

/// Elapsed time at the resolution a scan needs. Most scans finish well
/// under a second.
pub fn format_elapsed(elapsed: Duration) -> String {
  let micros = elapsed.as_micros();
  if micros < 1_000 {
    format!("{}µs", micros)
  } else if micros < 1_000_000 {
    format!("{:.1}ms", micros as f64 / 1_000.0)
  } else {
    format!("{:.2}s", elapsed.as_secs_f64())
  }
}

/// `count` followed by `noun`, pluralized with a trailing `s`.
pub fn count_of(count: usize, noun: &str) -> String {
  if count == 1 {
    format!("{} {}", count, noun)
  } else {
    format!("{} {}s", count, noun)
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

/// Status line for a scanned action: its name and how many inputs it has.
pub fn print_action_header(name: &str, inputs: usize) {
  print_success(&format!(
    "{} {}",
    name,
    format!("({})", count_of(inputs, "input")).if_supports_color(Stream::Stdout, |s| s.dimmed())
  ));
}

/// Heading for one lexed source file.
pub fn print_file_header(file: &impl Display, directives: usize) {
  println!(
    "{} {}",
    file.if_supports_color(Stream::Stdout, |s| s.bold()),
    format!("({})", count_of(directives, "directive")).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

/// Indented entry under a header: an input path or a directive.
pub fn print_item(item: &impl Display) {
  println!(
    "  {} {}",
    symbols::ARROW.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    item
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_elapsed() {
    assert_eq!(format_elapsed(Duration::from_micros(250)), "250µs");
    assert_eq!(format_elapsed(Duration::from_micros(4_300)), "4.3ms");
    assert_eq!(format_elapsed(Duration::from_millis(1_500)), "1.50s");
    assert_eq!(format_elapsed(Duration::from_secs(65)), "65.00s");
  }

  #[test]
  fn test_count_of() {
    assert_eq!(count_of(0, "input"), "0 inputs");
    assert_eq!(count_of(1, "input"), "1 input");
    assert_eq!(count_of(3, "directive"), "3 directives");
  }

  #[test]
  fn test_output_format() {
    assert!(OutputFormat::Json.is_json());
    assert!(!OutputFormat::default().is_json());
  }
}

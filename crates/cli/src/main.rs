mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use incscan_lib::consts::APP_NAME;

use crate::output::OutputFormat;

/// incscan - transitive include scanning for compilation actions
#[derive(Parser)]
#[command(name = APP_NAME)]
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
  /// Compute the included inputs of actions described by scan requests
  Scan {
    /// Paths to JSON scan request files
    #[arg(required = true)]
    requests: Vec<PathBuf>,

    /// Override the execution root of every request
    #[arg(long)]
    exec_root: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Maximum number of actions scanned at once
    #[arg(short = 'j', long)]
    parallelism: Option<usize>,

    /// Task name attached to each scan's trace span
    #[arg(long)]
    task: Option<String>,
  },

  /// Print the include directives found in source files
  Directives {
    /// Source files to read
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Scan {
      requests,
      exec_root,
      format,
      parallelism,
      task,
    } => cmd::cmd_scan(&requests, exec_root.as_deref(), format, parallelism, task),
    Commands::Directives { files, format } => cmd::cmd_directives(&files, format),
  }
}

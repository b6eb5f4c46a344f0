//! Types shared by scanners and the scan orchestrator.
//!
//! This module defines the error type, the shared accumulator, and the
//! configuration for running scans.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use dashmap::DashSet;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::consts::{DEFAULT_TASK_NAME, PARALLELISM_ENV};

/// Concurrently-mutable set of discovered artifacts shared by every unit of
/// one action. Scanners only ever insert into it.
pub type IncludeSet = DashSet<Artifact>;

/// Generated artifacts mapped to the path they will materialize at.
pub type LegalOutputPaths = HashMap<Artifact, PathBuf>;

/// Errors that abort an include scan.
#[derive(Debug, Error)]
pub enum ScanError {
  /// A file needed for directive extraction could not be read.
  #[error("failed to read {} for include scanning: {}", .path.display(), .source)]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A discovered include would have to be declared by absolute path.
  #[error("illegal absolute path to include file: {}", .path.display())]
  IllegalAbsolutePath { path: PathBuf },

  /// The execution context was cancelled.
  #[error("include scanning interrupted")]
  Interrupted,
}

impl ScanError {
  /// True for failures of the execution environment (unreadable files), as
  /// opposed to build-description defects. Neither kind is retried here.
  pub fn is_environmental(&self) -> bool {
    matches!(self, ScanError::Io { .. })
  }
}

/// Configuration for running scans over many actions.
#[derive(Debug, Clone)]
pub struct ScanConfig {
  /// Maximum number of actions scanned at once.
  pub parallelism: usize,

  /// Name attached to each action's trace span.
  pub task_name: String,
}

impl Default for ScanConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
      task_name: DEFAULT_TASK_NAME.to_string(),
    }
  }
}

impl ScanConfig {
  /// Defaults, with `INCSCAN_PARALLELISM` applied when it holds a positive
  /// integer.
  pub fn from_env() -> Self {
    let mut config = Self::default();
    if let Ok(value) = std::env::var(PARALLELISM_ENV)
      && let Ok(parallelism) = value.trim().parse::<usize>()
      && parallelism > 0
    {
      config.parallelism = parallelism;
    }
    config
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

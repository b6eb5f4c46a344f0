//! Implementation of the `incscan scan` command.
//!
//! Loads every request, scans them concurrently through one shared scanner
//! supplier, and reports each action's inputs. Any failed action makes the
//! command exit non-zero after all results are printed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde::Serialize;

use incscan_lib::request::ScanRequest;
use incscan_lib::scan::{ActionScan, CachingScannerSupplier, ScanConfig, ScanJob, scan_actions};

use crate::output::{
  OutputFormat, count_of, format_elapsed, print_action_header, print_error, print_info, print_item, print_json,
};

/// One entry of the JSON report.
#[derive(Debug, Serialize)]
struct ActionReport<'a> {
  request: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  inputs: Option<Vec<PathBuf>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

impl<'a> From<&'a ActionScan> for ActionReport<'a> {
  fn from(scan: &'a ActionScan) -> Self {
    match &scan.result {
      Ok(inputs) => ActionReport {
        request: &scan.name,
        inputs: Some(inputs.iter().map(|a| a.path()).collect()),
        error: None,
      },
      Err(e) => ActionReport {
        request: &scan.name,
        inputs: None,
        error: Some(e.to_string()),
      },
    }
  }
}

pub fn cmd_scan(
  requests: &[PathBuf],
  exec_root: Option<&Path>,
  format: OutputFormat,
  parallelism: Option<usize>,
  task: Option<String>,
) -> Result<()> {
  let mut config = ScanConfig::from_env();
  if let Some(parallelism) = parallelism {
    config.parallelism = parallelism.max(1);
  }
  if let Some(task) = task {
    config.task_name = task;
  }

  let exec_root = exec_root
    .map(|root| {
      dunce::canonicalize(root).with_context(|| format!("Failed to resolve execution root: {}", root.display()))
    })
    .transpose()?;

  let jobs = requests
    .iter()
    .map(|path| load_job(path, exec_root.as_deref()))
    .collect::<Result<Vec<_>>>()?;

  let started = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let supplier = Arc::new(CachingScannerSupplier::new());
  let results = rt.block_on(scan_actions(jobs, supplier.clone(), &config));

  if format.is_json() {
    let report: Vec<ActionReport> = results.iter().map(ActionReport::from).collect();
    print_json(&report)?;
  } else {
    for scan in &results {
      print_action(scan);
    }
    print_info(&format!(
      "Scanned {} with {} in {}",
      count_of(results.len(), "action"),
      count_of(supplier.len(), "scanner"),
      format_elapsed(started.elapsed())
    ));
  }

  let failed = results.iter().filter(|scan| !scan.is_ok()).count();
  if failed > 0 {
    bail!("{} of {} action(s) failed", failed, results.len());
  }
  Ok(())
}

fn load_job(path: &Path, exec_root: Option<&Path>) -> Result<ScanJob> {
  let request =
    ScanRequest::load(path).with_context(|| format!("Failed to load scan request: {}", path.display()))?;

  let canonical =
    dunce::canonicalize(path).with_context(|| format!("Failed to resolve scan request path: {}", path.display()))?;
  let base_dir = canonical.parent().unwrap_or(Path::new("/"));

  request
    .into_job(path.display().to_string(), base_dir, exec_root)
    .with_context(|| format!("Invalid scan request: {}", path.display()))
}

fn print_action(scan: &ActionScan) {
  match &scan.result {
    Ok(inputs) => {
      print_action_header(&scan.name, inputs.len());
      for input in inputs {
        print_item(input);
      }
    }
    Err(e) => print_error(&format!("{}: {}", scan.name, e)),
  }
}

//! Concurrent scanning of many actions.
//!
//! Scans are CPU and filesystem bound, so each one runs on the blocking pool.
//! A semaphore caps how many run at once. All actions share one supplier, so
//! identical search configurations reuse the same scanner and file memo.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::artifact::Artifact;
use crate::context::ExecutionContext;
use crate::unit::CompilationUnit;

use super::scan_for_included_inputs;
use super::supplier::IncludeScannerSupplier;
use super::types::{ScanConfig, ScanError};

/// One action to scan.
#[derive(Debug, Clone)]
pub struct ScanJob {
  /// Label used in logs and reports, usually the request file.
  pub name: String,
  pub unit: CompilationUnit,
  pub ctx: ExecutionContext,
}

/// Outcome of scanning one action.
#[derive(Debug)]
pub struct ActionScan {
  pub name: String,
  pub result: Result<Vec<Artifact>, BatchError>,
}

impl ActionScan {
  pub fn is_ok(&self) -> bool {
    self.result.is_ok()
  }
}

#[derive(Debug, Error)]
pub enum BatchError {
  #[error(transparent)]
  Scan(#[from] ScanError),

  /// The scan task panicked or was cancelled before finishing.
  #[error("scan task did not complete: {message}")]
  Join { message: String },
}

/// Scan every job, at most `config.parallelism` at a time.
///
/// Results come back in job order. Each keeps its own outcome, so one failing
/// action never hides the others.
pub async fn scan_actions(
  jobs: Vec<ScanJob>,
  supplier: Arc<dyn IncludeScannerSupplier>,
  config: &ScanConfig,
) -> Vec<ActionScan> {
  let total = jobs.len();
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));
  let mut join_set = JoinSet::new();

  info!(actions = total, parallelism = config.parallelism, "scanning actions");

  let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();
  for (index, job) in jobs.into_iter().enumerate() {
    let supplier = supplier.clone();
    let semaphore = semaphore.clone();
    let task_name = config.task_name.clone();

    join_set.spawn(async move {
      let name = job.name.clone();
      let result = run_job(job, supplier, semaphore, task_name).await;
      (index, ActionScan { name, result })
    });
  }

  let mut slots: Vec<Option<ActionScan>> = (0..total).map(|_| None).collect();
  while let Some(joined) = join_set.join_next().await {
    match joined {
      Ok((index, scan)) => {
        if let Err(e) = &scan.result {
          warn!(action = %scan.name, error = %e, "action scan failed");
        }
        slots[index] = Some(scan);
      }
      Err(e) => error!(error = %e, "scan task panicked"),
    }
  }

  let results = fill_unreported(slots, names);
  let failed = results.iter().filter(|scan| !scan.is_ok()).count();
  info!(actions = results.len(), failed, "finished scanning actions");
  results
}

/// Pair every slot with its job name. A job whose task never reported back
/// becomes a [`BatchError::Join`] failure, so no action goes missing.
fn fill_unreported(slots: Vec<Option<ActionScan>>, names: Vec<String>) -> Vec<ActionScan> {
  slots
    .into_iter()
    .zip(names)
    .map(|(slot, name)| {
      slot.unwrap_or_else(|| ActionScan {
        name,
        result: Err(BatchError::Join {
          message: "scan task exited without a result".to_string(),
        }),
      })
    })
    .collect()
}

async fn run_job(
  job: ScanJob,
  supplier: Arc<dyn IncludeScannerSupplier>,
  semaphore: Arc<Semaphore>,
  task_name: String,
) -> Result<Vec<Artifact>, BatchError> {
  let _permit = semaphore
    .acquire()
    .await
    .map_err(|e| BatchError::Join { message: e.to_string() })?;

  let ScanJob { name, unit, ctx } = job;
  let task = format!("{} {}", task_name, name);
  let scanned = tokio::task::spawn_blocking(move || scan_for_included_inputs(&unit, supplier.as_ref(), &ctx, &task)).await;

  match scanned {
    Ok(result) => result.map_err(BatchError::from),
    Err(e) => Err(BatchError::Join { message: e.to_string() }),
  }
}

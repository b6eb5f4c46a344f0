//! Include scanning for compilation actions.
//!
//! This module provides the per-action entry point, [`scan_for_included_inputs`].
//! It handles:
//! - fanning out over the primary unit and its auxiliary units (one level)
//! - building each unit's search configuration
//! - sharing scanners through an [`IncludeScannerSupplier`]
//! - filtering toolchain headers and validating the declared inputs
//!
//! # Modules
//!
//! - [`scanner`] - the scanner contract and the path-based implementation
//! - [`supplier`] - scanner instance cache keyed by search configuration
//! - [`cache`] - directive and existence memo shared across scanners
//! - [`batch`] - concurrent scanning of many actions
//! - [`types`] - errors, accumulator and configuration

pub mod batch;
pub mod cache;
pub mod scanner;
pub mod supplier;
pub mod types;

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{Span, debug, info, warn};

use crate::artifact::Artifact;
use crate::context::ExecutionContext;
use crate::paths::{normalize, relative_to, starts_with_any};
use crate::unit::CompilationUnit;

pub use batch::{ActionScan, BatchError, ScanJob, scan_actions};
pub use cache::SourceCache;
pub use scanner::{IncludeScanner, PathIncludeScanner};
pub use supplier::{CachingScannerSupplier, IncludeScannerSupplier, ScannerKey};
pub use types::{IncludeSet, LegalOutputPaths, ScanConfig, ScanError};

/// Returns the files transitively included by the sources of `action` and
/// its auxiliary units, ready to be declared as action inputs.
///
/// This is the main entry point for include scanning. It:
/// 1. Scans the primary unit and each direct auxiliary unit in parallel,
///    all writing into one shared accumulator
/// 2. Drops files found under absolute builtin include directories (the
///    toolchain provides those)
/// 3. Rejects any remaining file that could only be declared by absolute path
///
/// The whole call runs inside an `include_scan` span tagged with `task_name`.
///
/// # Errors
///
/// - [`ScanError::Io`] if a found file cannot be read
/// - [`ScanError::IllegalAbsolutePath`] if a found file lies outside every artifact root
/// - [`ScanError::Interrupted`] if `ctx` is cancelled
///
/// No partial result is ever returned.
pub fn scan_for_included_inputs(
  action: &CompilationUnit,
  supplier: &dyn IncludeScannerSupplier,
  ctx: &ExecutionContext,
  task_name: &str,
) -> Result<Vec<Artifact>, ScanError> {
  let span = ctx.scan_span(task_name);
  let _entered = span.enter();
  let started = Instant::now();

  info!(
    main = %action.main_source,
    auxiliary = action.auxiliary.len(),
    "include scan started"
  );

  let includes = IncludeSet::new();
  let result =
    scan_units(action, supplier, ctx, &includes).and_then(|builtin_roots| collect_inputs(&includes, &builtin_roots));

  match &result {
    Ok(inputs) => info!(
      found = includes.len(),
      inputs = inputs.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "include scan complete"
    ),
    Err(e) => warn!(error = %e, "include scan failed"),
  }

  result
}

/// Scan `action` and its direct auxiliaries into `includes`.
///
/// Returns the absolute builtin include roots, resolved against the execution
/// root, for [`collect_inputs`] to filter with.
pub fn scan_units(
  action: &CompilationUnit,
  supplier: &dyn IncludeScannerSupplier,
  ctx: &ExecutionContext,
  includes: &IncludeSet,
) -> Result<Vec<PathBuf>, ScanError> {
  let absolute_builtin_roots: Vec<PathBuf> = action
    .builtin_include_dirs
    .iter()
    .filter(|dir| dir.is_absolute())
    .map(|dir| normalize(&ctx.exec_root().join(dir)))
    .collect();

  let units: Vec<&CompilationUnit> = action.scannables().collect();
  let span = Span::current();

  units.into_par_iter().try_for_each(|unit| {
    span.in_scope(|| scan_unit(unit, &action.builtin_include_dirs, supplier, ctx, includes))
  })?;

  Ok(absolute_builtin_roots)
}

fn scan_unit(
  unit: &CompilationUnit,
  builtin_include_dirs: &[PathBuf],
  supplier: &dyn IncludeScannerSupplier,
  ctx: &ExecutionContext,
  includes: &IncludeSet,
) -> Result<(), ScanError> {
  ctx.check_interrupted()?;

  let exec_root = ctx.exec_root();
  let include_dirs = unit.angle_include_dirs(builtin_include_dirs);
  let scanner = supplier.scanner_for(
    relative_to(exec_root, &unit.quote_include_dirs),
    relative_to(exec_root, &include_dirs),
  );

  // Entry sources are inputs whatever the scanner records, as for the
  // headers listed in a header module's module map.
  for source in &unit.sources {
    includes.insert(source.clone());
  }

  debug!(
    main = %unit.main_source,
    sources = unit.sources.len(),
    cmdline_includes = unit.cmdline_includes.len(),
    "scanning compilation unit"
  );

  scanner.process(
    &unit.main_source,
    &unit.sources,
    &unit.legal_generated_files,
    &unit.cmdline_includes,
    includes,
    ctx,
  )
}

/// Filter and validate the accumulated includes.
///
/// Files under `absolute_builtin_roots` are dropped. A file whose root has no
/// parent fails the whole call. The result is sorted for stable output, but
/// callers should treat it as a set.
pub fn collect_inputs(includes: &IncludeSet, absolute_builtin_roots: &[PathBuf]) -> Result<Vec<Artifact>, ScanError> {
  let mut found: Vec<Artifact> = includes.iter().map(|a| a.key().clone()).collect();
  found.sort();

  let mut inputs = Vec::with_capacity(found.len());
  for included in found {
    let path = included.path();
    if starts_with_any(&path, absolute_builtin_roots) {
      continue;
    }
    if !included.root().has_parent() {
      return Err(ScanError::IllegalAbsolutePath { path });
    }
    inputs.push(included);
  }
  Ok(inputs)
}

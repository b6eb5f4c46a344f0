//! Per-action execution context.
//!
//! Carries what the surrounding build system provides to a scan: the
//! execution root, the artifact resolver for files found on disk, and a
//! cancellation flag.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Span, info_span};

use crate::artifact::{ArtifactResolver, ArtifactRoot, RootSet};
use crate::paths::normalize;
use crate::scan::ScanError;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
  exec_root: PathBuf,
  resolver: Arc<dyn ArtifactResolver>,
  interrupted: Arc<AtomicBool>,
}

impl ExecutionContext {
  /// A context whose only artifact root is the execution root itself.
  pub fn new(exec_root: impl AsRef<Path>) -> Self {
    let exec_root = normalize(exec_root.as_ref());
    let roots = RootSet::new([ArtifactRoot::source(&exec_root)]);
    Self::with_resolver(exec_root, Arc::new(roots))
  }

  pub fn with_resolver(exec_root: impl AsRef<Path>, resolver: Arc<dyn ArtifactResolver>) -> Self {
    Self {
      exec_root: normalize(exec_root.as_ref()),
      resolver,
      interrupted: Arc::new(AtomicBool::new(false)),
    }
  }

  pub fn exec_root(&self) -> &Path {
    &self.exec_root
  }

  pub fn resolver(&self) -> &dyn ArtifactResolver {
    self.resolver.as_ref()
  }

  /// Handle that lets another thread cancel scans running under this context.
  pub fn interrupt_handle(&self) -> InterruptHandle {
    InterruptHandle(self.interrupted.clone())
  }

  pub fn is_interrupted(&self) -> bool {
    self.interrupted.load(Ordering::Relaxed)
  }

  pub fn check_interrupted(&self) -> Result<(), ScanError> {
    if self.is_interrupted() {
      return Err(ScanError::Interrupted);
    }
    Ok(())
  }

  /// The span wrapping one orchestration call.
  pub fn scan_span(&self, task_name: &str) -> Span {
    info_span!("include_scan", task = task_name, exec_root = %self.exec_root.display())
  }
}

#[derive(Debug, Clone)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
  pub fn interrupt(&self) {
    self.0.store(true, Ordering::Relaxed);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_context_resolves_under_exec_root() {
    let ctx = ExecutionContext::new("/work/./tree");
    assert_eq!(ctx.exec_root(), Path::new("/work/tree"));

    let artifact = ctx.resolver().resolve(Path::new("/work/tree/src/a.h"));
    assert!(artifact.root().has_parent());
    assert_eq!(artifact.rel_path(), Path::new("src/a.h"));
  }

  #[test]
  fn interrupt_is_shared_between_clones() {
    let ctx = ExecutionContext::new("/work");
    let clone = ctx.clone();
    assert!(ctx.check_interrupted().is_ok());

    ctx.interrupt_handle().interrupt();
    assert!(clone.is_interrupted());
    assert!(matches!(clone.check_interrupted(), Err(ScanError::Interrupted)));
  }
}

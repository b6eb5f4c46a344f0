//! Scanner instance cache.
//!
//! Actions with the same search configuration share one scanner, and every
//! scanner of a supplier shares one [`SourceCache`], so directive extraction
//! and existence checks happen once per file per build invocation.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::cache::SourceCache;
use super::scanner::{IncludeScanner, PathIncludeScanner};

/// Hands out scanners for a search configuration.
pub trait IncludeScannerSupplier: Send + Sync {
  /// Returns the possibly shared scanner for a pair of ordered search roots.
  fn scanner_for(&self, quote_include_paths: Vec<PathBuf>, include_paths: Vec<PathBuf>) -> Arc<dyn IncludeScanner>;
}

/// Cache key: both root lists, order-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScannerKey {
  pub quote_include_paths: Vec<PathBuf>,
  pub include_paths: Vec<PathBuf>,
}

/// Supplier that keeps one [`PathIncludeScanner`] per distinct configuration.
#[derive(Debug, Default)]
pub struct CachingScannerSupplier {
  cache: Arc<SourceCache>,
  scanners: DashMap<ScannerKey, Arc<PathIncludeScanner>>,
}

impl CachingScannerSupplier {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of distinct scanner configurations seen so far.
  pub fn len(&self) -> usize {
    self.scanners.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scanners.is_empty()
  }

  pub fn source_cache(&self) -> &SourceCache {
    &self.cache
  }

  /// Drop every cached scanner and file memo.
  pub fn clear(&self) {
    self.scanners.clear();
    self.cache.clear();
  }
}

impl IncludeScannerSupplier for CachingScannerSupplier {
  fn scanner_for(&self, quote_include_paths: Vec<PathBuf>, include_paths: Vec<PathBuf>) -> Arc<dyn IncludeScanner> {
    let key = ScannerKey {
      quote_include_paths,
      include_paths,
    };
    if let Some(scanner) = self.scanners.get(&key) {
      return scanner.value().clone();
    }

    debug!(
      quote_paths = key.quote_include_paths.len(),
      include_paths = key.include_paths.len(),
      "creating include scanner"
    );
    let scanner = Arc::new(PathIncludeScanner::new(
      key.quote_include_paths.clone(),
      key.include_paths.clone(),
      self.cache.clone(),
    ));
    // A concurrent caller may have won the race; keep whichever got in first.
    self.scanners.entry(key).or_insert(scanner).value().clone()
  }
}

//! Filesystem memo shared by every scanner of one supplier.
//!
//! Directive lists depend only on file content, and existence checks only on
//! the path, so both are cached across scanners regardless of their search
//! configuration. Generated headers can appear or be rewritten while the
//! cache is alive, so:
//! - a directive list is reused only while the file's length and mtime match
//! - only positive existence checks are remembered

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::{DashMap, DashSet};

use crate::directive::{Directive, extract_directives};

/// Identity of one version of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
  len: u64,
  modified: Option<SystemTime>,
}

impl FileStamp {
  fn of(metadata: &fs::Metadata) -> Self {
    Self {
      len: metadata.len(),
      modified: metadata.modified().ok(),
    }
  }
}

#[derive(Debug)]
struct CachedDirectives {
  stamp: FileStamp,
  directives: Arc<[Directive]>,
}

#[derive(Debug, Default)]
pub struct SourceCache {
  directives: DashMap<PathBuf, CachedDirectives>,
  files: DashSet<PathBuf>,
}

impl SourceCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Directives of the file at `path`, reading it again whenever its length
  /// or modification time changed since the last read.
  ///
  /// Read failures are not cached.
  pub fn directives(&self, path: &Path) -> io::Result<Arc<[Directive]>> {
    let stamp = FileStamp::of(&fs::metadata(path)?);
    if let Some(hit) = self.directives.get(path)
      && hit.stamp == stamp
    {
      return Ok(hit.directives.clone());
    }

    let content = fs::read(path)?;
    let directives: Arc<[Directive]> = extract_directives(&content).into();
    self.directives.insert(
      path.to_path_buf(),
      CachedDirectives {
        stamp,
        directives: directives.clone(),
      },
    );
    Ok(directives)
  }

  /// Whether a regular file exists at `path`. Misses are always re-checked.
  pub fn is_file(&self, path: &Path) -> bool {
    if self.files.contains(path) {
      return true;
    }
    let exists = path.is_file();
    if exists {
      self.files.insert(path.to_path_buf());
    }
    exists
  }

  /// Number of files whose directives are cached.
  pub fn len(&self) -> usize {
    self.directives.len()
  }

  pub fn is_empty(&self) -> bool {
    self.directives.is_empty()
  }

  pub fn clear(&self) {
    self.directives.clear();
    self.files.clear();
  }
}

//! The include scanner.
//!
//! A scanner is bound to one search configuration: an ordered list of
//! quote-form roots and an ordered list of angle-form roots. Resolution
//! follows the usual toolchain rules:
//! - `"name"` searches the including file's directory, then the quote roots,
//!   then the angle roots
//! - `<name>` searches the angle roots only
//! - within a list the first existing candidate wins
//!
//! Generated files listed in the legal output map resolve even when they do
//! not exist on disk yet.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::artifact::Artifact;
use crate::context::ExecutionContext;
use crate::directive::{Directive, IncludeForm};
use crate::paths::normalize;

use super::cache::SourceCache;
use super::types::{IncludeSet, LegalOutputPaths, ScanError};

/// Discovers the transitive include closure of a set of entry sources.
///
/// Implementations must be safe to call from many scans at once.
pub trait IncludeScanner: Send + Sync {
  /// Follow include directives from every artifact in `sources`, adding each
  /// entry source and every file found into `includes`.
  ///
  /// `cmdline_includes` are resolved as quote-form names relative to
  /// `main_source`'s directory and added as if some scanned file included
  /// them. Directives that resolve nowhere are skipped. Fails only when a
  /// file that was found cannot be read.
  fn process(
    &self,
    main_source: &Artifact,
    sources: &[Artifact],
    legal_output_paths: &LegalOutputPaths,
    cmdline_includes: &[String],
    includes: &IncludeSet,
    ctx: &ExecutionContext,
  ) -> Result<(), ScanError>;
}

/// Scanner resolving directives against fixed search roots on disk.
#[derive(Debug)]
pub struct PathIncludeScanner {
  quote_include_paths: Vec<PathBuf>,
  include_paths: Vec<PathBuf>,
  cache: Arc<SourceCache>,
}

impl PathIncludeScanner {
  pub fn new(quote_include_paths: Vec<PathBuf>, include_paths: Vec<PathBuf>, cache: Arc<SourceCache>) -> Self {
    Self {
      quote_include_paths,
      include_paths,
      cache,
    }
  }

  pub fn quote_include_paths(&self) -> &[PathBuf] {
    &self.quote_include_paths
  }

  pub fn include_paths(&self) -> &[PathBuf] {
    &self.include_paths
  }

  /// Roots searched for a directive of the given form, in priority order.
  fn search_dirs<'a>(&'a self, form: IncludeForm, includer_dir: Option<&'a Path>) -> Vec<&'a Path> {
    match form {
      IncludeForm::Quote => includer_dir
        .into_iter()
        .chain(self.quote_include_paths.iter().map(PathBuf::as_path))
        .chain(self.include_paths.iter().map(PathBuf::as_path))
        .collect(),
      IncludeForm::Angle => self.include_paths.iter().map(PathBuf::as_path).collect(),
    }
  }

  /// Resolve `name` to an artifact, or `None` if no root holds it.
  fn locate(
    &self,
    name: &str,
    form: IncludeForm,
    includer_dir: Option<&Path>,
    generated: &HashMap<PathBuf, &Artifact>,
    ctx: &ExecutionContext,
  ) -> Option<Artifact> {
    let target = Path::new(name);
    if target.is_absolute() {
      return self.candidate(normalize(target), generated, ctx);
    }
    self
      .search_dirs(form, includer_dir)
      .into_iter()
      .find_map(|dir| self.candidate(normalize(&dir.join(target)), generated, ctx))
  }

  fn candidate(
    &self,
    path: PathBuf,
    generated: &HashMap<PathBuf, &Artifact>,
    ctx: &ExecutionContext,
  ) -> Option<Artifact> {
    if let Some(artifact) = generated.get(&path) {
      return Some((*artifact).clone());
    }
    if self.cache.is_file(&path) {
      return Some(ctx.resolver().resolve(&path));
    }
    None
  }

  /// Directives of `artifact`, or `None` for a generated file that has not
  /// materialized yet.
  fn directives_of(
    &self,
    artifact: &Artifact,
    legal_output_paths: &LegalOutputPaths,
  ) -> Result<Option<Arc<[Directive]>>, ScanError> {
    let path = match legal_output_paths.get(artifact) {
      Some(materialized) => {
        if !self.cache.is_file(materialized) {
          debug!(artifact = %artifact, "generated file not materialized, not scanning it");
          return Ok(None);
        }
        materialized.clone()
      }
      None => artifact.path(),
    };
    self
      .cache
      .directives(&path)
      .map(Some)
      .map_err(|source| ScanError::Io { path, source })
  }
}

impl IncludeScanner for PathIncludeScanner {
  fn process(
    &self,
    main_source: &Artifact,
    sources: &[Artifact],
    legal_output_paths: &LegalOutputPaths,
    cmdline_includes: &[String],
    includes: &IncludeSet,
    ctx: &ExecutionContext,
  ) -> Result<(), ScanError> {
    let generated: HashMap<PathBuf, &Artifact> = legal_output_paths
      .keys()
      .map(|artifact| (artifact.path(), artifact))
      .collect();

    let mut visited: HashSet<Artifact> = HashSet::new();
    let mut pending: Vec<Artifact> = Vec::new();

    for source in sources {
      includes.insert(source.clone());
      if visited.insert(source.clone()) {
        pending.push(source.clone());
      }
    }

    let main_dir = main_source.path().parent().map(Path::to_path_buf);
    for name in cmdline_includes {
      match self.locate(name, IncludeForm::Quote, main_dir.as_deref(), &generated, ctx) {
        Some(found) => {
          includes.insert(found.clone());
          if visited.insert(found.clone()) {
            pending.push(found);
          }
        }
        None => debug!(include = %name, "command-line include not found"),
      }
    }

    while let Some(artifact) = pending.pop() {
      ctx.check_interrupted()?;

      let Some(directives) = self.directives_of(&artifact, legal_output_paths)? else {
        continue;
      };
      let artifact_path = artifact.path();
      let includer_dir = artifact_path.parent();

      for directive in directives.iter() {
        match self.locate(&directive.target, directive.form, includer_dir, &generated, ctx) {
          Some(found) => {
            if visited.insert(found.clone()) {
              includes.insert(found.clone());
              pending.push(found);
            }
          }
          None => trace!(file = %artifact, directive = %directive, "unresolved include"),
        }
      }
    }

    debug!(
      main = %main_source,
      visited = visited.len(),
      "include closure complete"
    );
    Ok(())
  }
}

//! Compilation units: what to include-scan for one action.
//!
//! A plain translation unit and a header-module unit share one shape; the
//! difference is only which artifacts are listed as entry sources. Auxiliary
//! units are alternate variants of the same logical unit (for example an
//! optimized build) that are scanned alongside the primary one. Only one
//! level of auxiliaries is ever scanned.

use std::path::PathBuf;

use crate::artifact::Artifact;
use crate::scan::LegalOutputPaths;

#[derive(Debug, Clone)]
pub struct CompilationUnit {
  /// The source `cmdline_includes` are interpreted relative to.
  ///
  /// Scanned only if it is also listed in `sources`; a header module's
  /// module map is the main source but is never parsed for directives.
  pub main_source: Artifact,

  /// Entry points for directive following. Always part of the result.
  pub sources: Vec<Artifact>,

  /// Roots for `"..."` directives, searched before `include_dirs`.
  pub quote_include_dirs: Vec<PathBuf>,

  /// Roots for `<...>` directives.
  pub include_dirs: Vec<PathBuf>,

  /// System roots, searched after `include_dirs`.
  pub system_include_dirs: Vec<PathBuf>,

  /// Toolchain roots, possibly absolute. Only the primary unit's list is used.
  pub builtin_include_dirs: Vec<PathBuf>,

  /// Includes forced from the command line (`-include foo.h`).
  pub cmdline_includes: Vec<String>,

  /// Generated artifacts mapped to where they materialize on disk.
  pub legal_generated_files: LegalOutputPaths,

  /// Variants scanned alongside this unit.
  pub auxiliary: Vec<CompilationUnit>,
}

impl CompilationUnit {
  /// A unit scanning only its main source.
  pub fn new(main_source: Artifact) -> Self {
    Self {
      sources: vec![main_source.clone()],
      main_source,
      quote_include_dirs: Vec::new(),
      include_dirs: Vec::new(),
      system_include_dirs: Vec::new(),
      builtin_include_dirs: Vec::new(),
      cmdline_includes: Vec::new(),
      legal_generated_files: LegalOutputPaths::new(),
      auxiliary: Vec::new(),
    }
  }

  pub fn with_sources(mut self, sources: Vec<Artifact>) -> Self {
    self.sources = sources;
    self
  }

  pub fn with_quote_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
    self.quote_include_dirs = dirs;
    self
  }

  pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
    self.include_dirs = dirs;
    self
  }

  pub fn with_system_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
    self.system_include_dirs = dirs;
    self
  }

  pub fn with_builtin_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
    self.builtin_include_dirs = dirs;
    self
  }

  pub fn with_cmdline_includes(mut self, includes: Vec<String>) -> Self {
    self.cmdline_includes = includes;
    self
  }

  pub fn with_legal_generated_files(mut self, files: LegalOutputPaths) -> Self {
    self.legal_generated_files = files;
    self
  }

  pub fn with_auxiliary(mut self, auxiliary: Vec<CompilationUnit>) -> Self {
    self.auxiliary = auxiliary;
    self
  }

  /// This unit followed by its direct auxiliaries. Auxiliaries of
  /// auxiliaries are not visited.
  pub fn scannables(&self) -> impl Iterator<Item = &CompilationUnit> {
    std::iter::once(self).chain(self.auxiliary.iter())
  }

  /// Angle-form roots: own include dirs, then own system dirs, then the
  /// given builtin dirs. Order preserved, no dedup.
  pub fn angle_include_dirs(&self, builtin_include_dirs: &[PathBuf]) -> Vec<PathBuf> {
    self
      .include_dirs
      .iter()
      .chain(&self.system_include_dirs)
      .chain(builtin_include_dirs)
      .cloned()
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use std::path::Path;
  use std::sync::Arc;

  use super::*;
  use crate::artifact::ArtifactRoot;

  fn artifact(rel: &str) -> Artifact {
    Artifact::new(Arc::new(ArtifactRoot::source("/work")), rel)
  }

  #[test]
  fn new_unit_scans_main_source() {
    let unit = CompilationUnit::new(artifact("a.cc"));
    assert_eq!(unit.sources, vec![artifact("a.cc")]);
    assert!(unit.auxiliary.is_empty());
  }

  #[test]
  fn scannables_stop_after_one_level() {
    let nested = CompilationUnit::new(artifact("nested.cc"));
    let aux = CompilationUnit::new(artifact("aux.cc")).with_auxiliary(vec![nested]);
    let unit = CompilationUnit::new(artifact("a.cc")).with_auxiliary(vec![aux]);

    let mains: Vec<_> = unit.scannables().map(|u| u.main_source.rel_path().to_path_buf()).collect();
    assert_eq!(mains, vec![PathBuf::from("a.cc"), PathBuf::from("aux.cc")]);
  }

  #[test]
  fn angle_dirs_put_unit_dirs_first() {
    let unit = CompilationUnit::new(artifact("a.cc"))
      .with_include_dirs(vec![PathBuf::from("inc"), PathBuf::from("shared")])
      .with_system_include_dirs(vec![PathBuf::from("sys"), PathBuf::from("shared")]);

    let dirs = unit.angle_include_dirs(&[PathBuf::from("/usr/include")]);
    let dirs: Vec<&Path> = dirs.iter().map(PathBuf::as_path).collect();
    assert_eq!(
      dirs,
      vec![
        Path::new("inc"),
        Path::new("shared"),
        Path::new("sys"),
        Path::new("shared"),
        Path::new("/usr/include"),
      ]
    );
  }
}

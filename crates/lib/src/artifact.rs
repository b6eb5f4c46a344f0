//! Logical file identities.
//!
//! An [`Artifact`] names a file by the [`ArtifactRoot`] it lives under plus a
//! root-relative path. Two artifacts are equal iff both parts are equal; the
//! concrete location is always `root.path().join(rel_path)`.
//!
//! Files found on disk during scanning are mapped back to artifacts through an
//! [`ArtifactResolver`]. [`RootSet`] is the standard resolver: the deepest
//! registered root containing a path wins, and a path outside every root
//! becomes an artifact under the filesystem root itself. Such artifacts have a
//! parentless root and are rejected as inputs unless they sit under an
//! absolute builtin include directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::paths::normalize;

/// What kind of tree an artifact root mounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
  /// Checked-in sources.
  #[default]
  Source,
  /// Files generated by earlier build actions.
  Output,
}

/// A logical mount point for artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactRoot {
  path: PathBuf,
  kind: RootKind,
}

impl ArtifactRoot {
  pub fn new(path: impl AsRef<Path>, kind: RootKind) -> Self {
    Self {
      path: normalize(path.as_ref()),
      kind,
    }
  }

  pub fn source(path: impl AsRef<Path>) -> Self {
    Self::new(path, RootKind::Source)
  }

  pub fn output(path: impl AsRef<Path>) -> Self {
    Self::new(path, RootKind::Output)
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn kind(&self) -> RootKind {
    self.kind
  }

  /// False when the root is the filesystem root, i.e. artifacts under it are
  /// really absolute paths.
  pub fn has_parent(&self) -> bool {
    self.path.parent().is_some()
  }
}

/// A file identity: root plus root-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Artifact {
  root: Arc<ArtifactRoot>,
  rel_path: PathBuf,
}

impl Artifact {
  pub fn new(root: Arc<ArtifactRoot>, rel_path: impl AsRef<Path>) -> Self {
    Self {
      root,
      rel_path: normalize(rel_path.as_ref()),
    }
  }

  /// An artifact rooted at the filesystem root of `path`.
  pub fn absolute(path: &Path) -> Self {
    let path = normalize(path);
    let fs_root = path.ancestors().last().unwrap_or(Path::new("")).to_path_buf();
    let rel_path = path.strip_prefix(&fs_root).unwrap_or(&path).to_path_buf();
    Self {
      root: Arc::new(ArtifactRoot::source(fs_root)),
      rel_path,
    }
  }

  pub fn root(&self) -> &ArtifactRoot {
    &self.root
  }

  pub fn rel_path(&self) -> &Path {
    &self.rel_path
  }

  /// Concrete location of this artifact.
  pub fn path(&self) -> PathBuf {
    self.root.path.join(&self.rel_path)
  }

  pub fn is_source(&self) -> bool {
    self.root.kind == RootKind::Source
  }
}

impl fmt::Display for Artifact {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path().display())
  }
}

/// Maps absolute paths discovered on disk to artifact identities.
pub trait ArtifactResolver: Send + Sync + fmt::Debug {
  fn resolve(&self, path: &Path) -> Artifact;
}

/// The set of artifact roots known to a build.
#[derive(Debug, Clone, Default)]
pub struct RootSet {
  /// Kept deepest-first so nested roots shadow their parents.
  roots: Vec<Arc<ArtifactRoot>>,
}

impl RootSet {
  pub fn new(roots: impl IntoIterator<Item = ArtifactRoot>) -> Self {
    let mut set = Self::default();
    for root in roots {
      set.add(root);
    }
    set
  }

  /// Register a root. Registering the same root twice is a no-op.
  pub fn add(&mut self, root: ArtifactRoot) -> Arc<ArtifactRoot> {
    if let Some(existing) = self.roots.iter().find(|r| r.as_ref() == &root) {
      return existing.clone();
    }
    let root = Arc::new(root);
    self.roots.push(root.clone());
    self
      .roots
      .sort_by(|a, b| b.path.components().count().cmp(&a.path.components().count()));
    root
  }

  pub fn roots(&self) -> &[Arc<ArtifactRoot>] {
    &self.roots
  }

  /// The deepest registered root containing `path`.
  pub fn find_root(&self, path: &Path) -> Option<&Arc<ArtifactRoot>> {
    self.roots.iter().find(|root| path.starts_with(&root.path))
  }
}

impl ArtifactResolver for RootSet {
  fn resolve(&self, path: &Path) -> Artifact {
    let path = normalize(path);
    match self.find_root(&path) {
      Some(root) => match path.strip_prefix(&root.path) {
        Ok(rel_path) => Artifact::new(root.clone(), rel_path),
        Err(_) => Artifact::absolute(&path),
      },
      None => Artifact::absolute(&path),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod artifact_root {
    use super::*;

    #[test]
    fn filesystem_root_has_no_parent() {
      assert!(!ArtifactRoot::source("/").has_parent());
      assert!(ArtifactRoot::source("/work").has_parent());
    }

    #[test]
    fn paths_are_normalized() {
      let root = ArtifactRoot::output("/work/./out/../bin");
      assert_eq!(root.path(), Path::new("/work/bin"));
      assert_eq!(root.kind(), RootKind::Output);
    }
  }

  mod artifact {
    use super::*;

    #[test]
    fn equality_uses_root_and_relative_path() {
      let root = Arc::new(ArtifactRoot::source("/work"));
      let a = Artifact::new(root.clone(), "lib/a.h");
      let b = Artifact::new(Arc::new(ArtifactRoot::source("/work")), "lib/./a.h");
      let c = Artifact::new(Arc::new(ArtifactRoot::output("/work")), "lib/a.h");

      assert_eq!(a, b);
      assert_ne!(a, c);
      assert_eq!(a.path(), PathBuf::from("/work/lib/a.h"));
    }

    #[test]
    fn absolute_artifact_is_parentless() {
      let artifact = Artifact::absolute(Path::new("/usr/include/stdio.h"));
      assert!(!artifact.root().has_parent());
      assert_eq!(artifact.path(), PathBuf::from("/usr/include/stdio.h"));
      assert_eq!(artifact.to_string(), "/usr/include/stdio.h");
    }
  }

  mod root_set {
    use super::*;

    #[test]
    fn deepest_root_wins() {
      let roots = RootSet::new([ArtifactRoot::source("/work"), ArtifactRoot::output("/work/out/bin")]);

      let generated = roots.resolve(Path::new("/work/out/bin/gen/config.h"));
      assert_eq!(generated.root().kind(), RootKind::Output);
      assert_eq!(generated.rel_path(), Path::new("gen/config.h"));

      let source = roots.resolve(Path::new("/work/src/main.h"));
      assert!(source.is_source());
      assert_eq!(source.rel_path(), Path::new("src/main.h"));
    }

    #[test]
    fn unknown_paths_become_absolute() {
      let roots = RootSet::new([ArtifactRoot::source("/work")]);
      let artifact = roots.resolve(Path::new("/opt/sdk/include/sdk.h"));
      assert!(!artifact.root().has_parent());
    }

    #[test]
    fn sibling_prefix_is_not_a_match() {
      let roots = RootSet::new([ArtifactRoot::source("/work")]);
      let artifact = roots.resolve(Path::new("/workspace/a.h"));
      assert!(!artifact.root().has_parent());
    }

    #[test]
    fn duplicate_roots_are_shared() {
      let mut roots = RootSet::default();
      let first = roots.add(ArtifactRoot::source("/work"));
      let second = roots.add(ArtifactRoot::source("/work"));
      assert!(Arc::ptr_eq(&first, &second));
      assert_eq!(roots.roots().len(), 1);
    }
  }
}

//! Search path helpers.
//!
//! Include directories arrive as execution-root-relative fragments (or, for
//! toolchain directories, absolute paths). These helpers turn them into the
//! absolute search roots scanners work with.

use std::path::{Component, Path, PathBuf};

/// Resolve each fragment against `exec_root`.
///
/// Order and duplicates are preserved; absolute fragments stay absolute.
pub fn relative_to<P: AsRef<Path>>(exec_root: &Path, fragments: &[P]) -> Vec<PathBuf> {
  fragments
    .iter()
    .map(|fragment| normalize(&exec_root.join(fragment)))
    .collect()
}

/// Whether `path` lies under any of `prefixes` (component-wise).
pub fn starts_with_any(path: &Path, prefixes: &[PathBuf]) -> bool {
  prefixes.iter().any(|prefix| path.starts_with(prefix))
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Never touches the filesystem, so symlinks are not
/// resolved. `..` at the root is dropped; leading `..` of a relative path is
/// kept.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => normalized.push(".."),
      },
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn relative_to_preserves_order_and_duplicates() {
    let roots = relative_to(Path::new("/work"), &["b", "a", "b", "third_party/zlib"]);
    assert_eq!(
      roots,
      vec![
        PathBuf::from("/work/b"),
        PathBuf::from("/work/a"),
        PathBuf::from("/work/b"),
        PathBuf::from("/work/third_party/zlib"),
      ]
    );
  }

  #[test]
  fn relative_to_keeps_absolute_fragments() {
    let roots = relative_to(Path::new("/work"), &[Path::new("/usr/include"), Path::new(".")]);
    assert_eq!(roots, vec![PathBuf::from("/usr/include"), PathBuf::from("/work")]);
  }

  #[test]
  fn relative_to_empty() {
    let fragments: [&str; 0] = [];
    assert!(relative_to(Path::new("/work"), &fragments).is_empty());
  }

  #[test]
  fn normalize_folds_dots() {
    assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
    assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
    assert_eq!(normalize(Path::new("../a/../../b")), PathBuf::from("../../b"));
    assert_eq!(normalize(Path::new("a/b/..")), PathBuf::from("a"));
  }

  #[test]
  fn starts_with_any_is_component_wise() {
    let prefixes = vec![PathBuf::from("/usr/include"), PathBuf::from("/opt/sdk")];
    assert!(starts_with_any(Path::new("/usr/include/stdio.h"), &prefixes));
    assert!(starts_with_any(Path::new("/opt/sdk"), &prefixes));
    assert!(!starts_with_any(Path::new("/usr/include2/x.h"), &prefixes));
    assert!(!starts_with_any(Path::new("/usr/include/x.h"), &[]));
  }
}

//! JSON scan requests.
//!
//! A request describes one compilation action the way a build system would
//! hand it over: the execution root, any extra artifact roots, and the
//! compilation unit with its search directories. Paths inside the unit are
//! execution-root-relative.
//!
//! ```json
//! {
//!   "version": 1,
//!   "execRoot": "/work",
//!   "roots": [{ "path": "out/bin", "kind": "output" }],
//!   "unit": {
//!     "mainSource": "src/a.cc",
//!     "quoteIncludeDirs": ["."],
//!     "builtinIncludeDirs": ["/usr/include"],
//!     "legalGeneratedFiles": { "out/bin/gen.h": "/tmp/gen.h" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::artifact::{ArtifactResolver, ArtifactRoot, RootKind, RootSet};
use crate::consts::REQUEST_VERSION;
use crate::context::ExecutionContext;
use crate::paths::normalize;
use crate::scan::{LegalOutputPaths, ScanJob};
use crate::unit::CompilationUnit;

#[derive(Debug, Error)]
pub enum RequestError {
  #[error("failed to read scan request {}: {}", .path.display(), .source)]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("invalid scan request: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("unsupported scan request version {0} (expected {expected})", expected = REQUEST_VERSION)]
  UnsupportedVersion(u32),

  /// A generated file was declared outside every output root.
  #[error("generated file {} is not under any output root", .path.display())]
  UnknownOutputRoot { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
  pub version: u32,

  /// Defaults to the directory holding the request file.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exec_root: Option<PathBuf>,

  /// Artifact roots besides the execution root itself.
  #[serde(default)]
  pub roots: Vec<RootDecl>,

  pub unit: UnitDecl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDecl {
  pub path: PathBuf,
  #[serde(default)]
  pub kind: RootKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitDecl {
  pub main_source: PathBuf,
  /// Empty means the main source alone.
  pub sources: Vec<PathBuf>,
  pub quote_include_dirs: Vec<PathBuf>,
  pub include_dirs: Vec<PathBuf>,
  pub system_include_dirs: Vec<PathBuf>,
  pub builtin_include_dirs: Vec<PathBuf>,
  pub cmdline_includes: Vec<String>,
  pub legal_generated_files: BTreeMap<PathBuf, PathBuf>,
  pub auxiliary: Vec<UnitDecl>,
}

impl ScanRequest {
  /// Load and validate a request file.
  pub fn load(path: &Path) -> Result<Self, RequestError> {
    let content = fs::read_to_string(path).map_err(|source| RequestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  pub fn from_json(content: &str) -> Result<Self, RequestError> {
    let request: ScanRequest = serde_json::from_str(content)?;
    if request.version != REQUEST_VERSION {
      return Err(RequestError::UnsupportedVersion(request.version));
    }
    Ok(request)
  }

  /// The execution root: `exec_root_override` if given, else the declared
  /// root resolved against `base_dir`.
  pub fn resolve_exec_root(&self, base_dir: &Path, exec_root_override: Option<&Path>) -> PathBuf {
    match (exec_root_override, &self.exec_root) {
      (Some(root), _) => normalize(&base_dir.join(root)),
      (None, Some(root)) => normalize(&base_dir.join(root)),
      (None, None) => normalize(base_dir),
    }
  }

  /// Turn the request into a job for the batch executor.
  ///
  /// `base_dir` anchors a relative execution root, normally the directory of
  /// the request file.
  pub fn into_job(
    self,
    name: impl Into<String>,
    base_dir: &Path,
    exec_root_override: Option<&Path>,
  ) -> Result<ScanJob, RequestError> {
    let exec_root = self.resolve_exec_root(base_dir, exec_root_override);

    let mut roots = RootSet::new([ArtifactRoot::source(&exec_root)]);
    for decl in &self.roots {
      roots.add(ArtifactRoot::new(exec_root.join(&decl.path), decl.kind));
    }

    let unit = build_unit(&self.unit, &exec_root, &roots)?;
    let name = name.into();
    debug!(request = %name, exec_root = %exec_root.display(), roots = roots.roots().len(), "loaded scan request");

    Ok(ScanJob {
      name,
      unit,
      ctx: ExecutionContext::with_resolver(exec_root, Arc::new(roots)),
    })
  }
}

fn build_unit(decl: &UnitDecl, exec_root: &Path, roots: &RootSet) -> Result<CompilationUnit, RequestError> {
  let resolve = |rel: &Path| roots.resolve(&exec_root.join(rel));

  let main_source = resolve(decl.main_source.as_path());
  let sources = if decl.sources.is_empty() {
    vec![main_source.clone()]
  } else {
    decl.sources.iter().map(|s| resolve(s.as_path())).collect()
  };

  let mut legal = LegalOutputPaths::new();
  for (declared, materialized) in &decl.legal_generated_files {
    let artifact = resolve(declared.as_path());
    if artifact.root().kind() != RootKind::Output || !artifact.root().has_parent() {
      return Err(RequestError::UnknownOutputRoot {
        path: declared.clone(),
      });
    }
    legal.insert(artifact, normalize(&exec_root.join(materialized)));
  }

  let auxiliary = decl
    .auxiliary
    .iter()
    .map(|aux| build_unit(aux, exec_root, roots))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(
    CompilationUnit::new(main_source)
      .with_sources(sources)
      .with_quote_include_dirs(decl.quote_include_dirs.clone())
      .with_include_dirs(decl.include_dirs.clone())
      .with_system_include_dirs(decl.system_include_dirs.clone())
      .with_builtin_include_dirs(decl.builtin_include_dirs.clone())
      .with_cmdline_includes(decl.cmdline_includes.clone())
      .with_legal_generated_files(legal)
      .with_auxiliary(auxiliary),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::scan::{CachingScannerSupplier, scan_for_included_inputs};
  use tempfile::TempDir;

  const EXAMPLE: &str = r#"{
    "version": 1,
    "execRoot": "/work",
    "roots": [{ "path": "out/bin", "kind": "output" }],
    "unit": {
      "mainSource": "src/a.cc",
      "quoteIncludeDirs": ["."],
      "builtinIncludeDirs": ["/usr/include"],
      "cmdlineIncludes": ["prelude.h"],
      "legalGeneratedFiles": { "out/bin/gen.h": "/tmp/gen.h" },
      "auxiliary": [{ "mainSource": "src/a_opt.cc" }]
    }
  }"#;

  mod parsing {
    use super::*;

    #[test]
    fn example_request() {
      let request = ScanRequest::from_json(EXAMPLE).unwrap();
      assert_eq!(request.exec_root.as_deref(), Some(Path::new("/work")));
      assert_eq!(request.roots[0].kind, RootKind::Output);
      assert_eq!(request.unit.main_source, PathBuf::from("src/a.cc"));
      assert!(request.unit.sources.is_empty());
      assert_eq!(request.unit.cmdline_includes, vec!["prelude.h"]);
      assert_eq!(request.unit.auxiliary[0].main_source, PathBuf::from("src/a_opt.cc"));
    }

    #[test]
    fn root_kind_defaults_to_source() {
      let request = ScanRequest::from_json(r#"{"version":1,"roots":[{"path":"ext"}],"unit":{"mainSource":"a.cc"}}"#)
        .unwrap();
      assert_eq!(request.roots[0].kind, RootKind::Source);
      assert!(request.exec_root.is_none());
    }

    #[test]
    fn unsupported_version() {
      let err = ScanRequest::from_json(r#"{"version":7,"unit":{"mainSource":"a.cc"}}"#).unwrap_err();
      assert!(matches!(err, RequestError::UnsupportedVersion(7)));
      assert_eq!(err.to_string(), "unsupported scan request version 7 (expected 1)");
    }

    #[test]
    fn malformed_json() {
      let err = ScanRequest::from_json("{\"version\": 1,").unwrap_err();
      assert!(matches!(err, RequestError::Parse(_)));
    }

    #[test]
    fn missing_file() {
      let temp = TempDir::new().unwrap();
      let err = ScanRequest::load(&temp.path().join("absent.json")).unwrap_err();
      assert!(matches!(err, RequestError::Read { .. }));
    }
  }

  mod jobs {
    use super::*;

    #[test]
    fn example_job() {
      let job = ScanRequest::from_json(EXAMPLE)
        .unwrap()
        .into_job("example", Path::new("/requests"), None)
        .unwrap();

      assert_eq!(job.name, "example");
      assert_eq!(job.ctx.exec_root(), Path::new("/work"));
      assert_eq!(job.unit.main_source.path(), PathBuf::from("/work/src/a.cc"));
      assert_eq!(job.unit.sources, vec![job.unit.main_source.clone()]);
      assert_eq!(job.unit.builtin_include_dirs, vec![PathBuf::from("/usr/include")]);

      let (generated, materialized) = job.unit.legal_generated_files.iter().next().unwrap();
      assert!(!generated.is_source());
      assert_eq!(generated.rel_path(), Path::new("gen.h"));
      assert_eq!(materialized, Path::new("/tmp/gen.h"));

      assert_eq!(job.unit.auxiliary.len(), 1);
    }

    #[test]
    fn exec_root_resolution() {
      let request = ScanRequest::from_json(r#"{"version":1,"execRoot":"../ws","unit":{"mainSource":"a.cc"}}"#).unwrap();
      let base = Path::new("/reqs/sub");

      assert_eq!(request.resolve_exec_root(base, None), PathBuf::from("/reqs/ws"));
      assert_eq!(
        request.resolve_exec_root(base, Some(Path::new("/elsewhere"))),
        PathBuf::from("/elsewhere")
      );

      let request = ScanRequest::from_json(r#"{"version":1,"unit":{"mainSource":"a.cc"}}"#).unwrap();
      assert_eq!(request.resolve_exec_root(base, None), PathBuf::from("/reqs/sub"));
    }

    #[test]
    fn generated_files_need_an_output_root() {
      let request = ScanRequest::from_json(
        r#"{"version":1,"execRoot":"/w","unit":{"mainSource":"a.cc","legalGeneratedFiles":{"gen/x.h":"/tmp/x.h"}}}"#,
      )
      .unwrap();
      let err = request.into_job("r", Path::new("/"), None).unwrap_err();
      match err {
        RequestError::UnknownOutputRoot { path } => assert_eq!(path, PathBuf::from("gen/x.h")),
        other => panic!("unexpected error: {}", other),
      }
    }

    #[test]
    fn request_scans_end_to_end() {
      let temp = TempDir::new().unwrap();
      fs::create_dir_all(temp.path().join("src")).unwrap();
      fs::create_dir_all(temp.path().join("out/gen")).unwrap();
      fs::write(temp.path().join("src/a.cc"), "#include \"out/gen/config.h\"\n#include \"b.h\"\n").unwrap();
      fs::write(temp.path().join("src/b.h"), "").unwrap();
      fs::write(
        temp.path().join("scan.json"),
        r#"{
          "version": 1,
          "roots": [{ "path": "out", "kind": "output" }],
          "unit": {
            "mainSource": "src/a.cc",
            "quoteIncludeDirs": ["."],
            "legalGeneratedFiles": { "out/gen/config.h": "out/gen/config.h" }
          }
        }"#,
      )
      .unwrap();

      let job = ScanRequest::load(&temp.path().join("scan.json"))
        .unwrap()
        .into_job("scan.json", temp.path(), None)
        .unwrap();
      let supplier = CachingScannerSupplier::new();
      let inputs = scan_for_included_inputs(&job.unit, &supplier, &job.ctx, "test").unwrap();

      let paths: Vec<PathBuf> = inputs.iter().map(|a| a.path()).collect();
      assert_eq!(inputs.len(), 3);
      assert!(paths.contains(&normalize(&temp.path().join("out/gen/config.h"))));
      assert!(paths.contains(&normalize(&temp.path().join("src/b.h"))));
    }
  }
}

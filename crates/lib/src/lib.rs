//! incscan-lib: transitive include resolution for compilation actions
//!
//! This crate computes the set of header files a compilation action reads,
//! so a build system can declare exact action inputs:
//! - `Artifact`: logical file identity (root + root-relative path)
//! - `CompilationUnit`: what to scan for one action (plus auxiliary variants)
//! - `IncludeScanner`: follows include directives across ordered search roots
//! - `CachingScannerSupplier`: shares scanners between identical search configurations
//! - `scan_for_included_inputs`: per-action orchestration, filtering and validation
//! - `ScanRequest` / `scan_actions`: JSON action descriptions and batch scanning

pub mod artifact;
pub mod consts;
pub mod context;
pub mod directive;
pub mod paths;
pub mod request;
pub mod scan;
pub mod unit;

pub use artifact::{Artifact, ArtifactResolver, ArtifactRoot, RootKind, RootSet};
pub use context::{ExecutionContext, InterruptHandle};
pub use request::{RequestError, ScanRequest};
pub use scan::{
  ActionScan, CachingScannerSupplier, IncludeScanner, IncludeScannerSupplier, IncludeSet, LegalOutputPaths, ScanConfig,
  ScanError, ScanJob, scan_actions, scan_for_included_inputs,
};
pub use unit::CompilationUnit;

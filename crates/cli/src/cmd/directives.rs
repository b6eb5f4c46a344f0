//! Directives command implementation.
//!
//! Prints what the directive lexer sees in each file, which helps when a
//! header unexpectedly goes missing from a scan.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use incscan_lib::directive::{Directive, extract_directives};

use crate::output::{OutputFormat, print_file_header, print_item, print_json};

#[derive(Debug, Serialize)]
struct FileDirectives<'a> {
  file: &'a Path,
  directives: Vec<Directive>,
}

pub fn cmd_directives(files: &[PathBuf], format: OutputFormat) -> Result<()> {
  let mut found = Vec::with_capacity(files.len());
  for file in files {
    let content = fs::read(file).with_context(|| format!("Failed to read source file: {}", file.display()))?;
    found.push(FileDirectives {
      file,
      directives: extract_directives(&content),
    });
  }

  if format.is_json() {
    return print_json(&found);
  }

  for entry in &found {
    print_file_header(&entry.file.display(), entry.directives.len());
    for directive in &entry.directives {
      print_item(directive);
    }
  }
  Ok(())
}

//! Include directive extraction.
//!
//! Recognizes `#include`, `#import` and `#include_next` lines and reports
//! their targets in file order. This is a lexical pass only:
//! - `//` and `/* */` comments are stripped (a block comment counts as a space),
//!   except inside a quoted or angle-bracket target
//! - backslash-newline continuations are joined
//! - string and character literals are skipped so comment markers inside
//!   them do not swallow later lines
//! - conditionals are not evaluated, so every directive counts
//! - computed includes (`#include FOO_H`) are ignored

use serde::Serialize;

/// The textual form of an include target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeForm {
  /// `#include "name"`
  Quote,
  /// `#include <name>`
  Angle,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Directive {
  pub form: IncludeForm,
  pub target: String,
}

impl Directive {
  pub fn quote(target: impl Into<String>) -> Self {
    Self {
      form: IncludeForm::Quote,
      target: target.into(),
    }
  }

  pub fn angle(target: impl Into<String>) -> Self {
    Self {
      form: IncludeForm::Angle,
      target: target.into(),
    }
  }
}

impl std::fmt::Display for Directive {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.form {
      IncludeForm::Quote => write!(f, "\"{}\"", self.target),
      IncludeForm::Angle => write!(f, "<{}>", self.target),
    }
  }
}

const DIRECTIVE_KEYWORDS: [&[u8]; 3] = [b"include", b"import", b"include_next"];

/// Extract include directives from file content, in file order.
pub fn extract_directives(content: &[u8]) -> Vec<Directive> {
  let mut directives = Vec::new();
  let mut line: Vec<u8> = Vec::new();
  let mut in_block_comment = false;
  let mut i = 0;

  while i < content.len() {
    let byte = content[i];
    let next = content.get(i + 1).copied();

    if in_block_comment {
      if byte == b'*' && next == Some(b'/') {
        in_block_comment = false;
        line.push(b' ');
        i += 2;
      } else {
        i += 1;
      }
      continue;
    }

    match byte {
      b'\\' if next == Some(b'\n') => i += 2,
      b'\\' if next == Some(b'\r') && content.get(i + 2) == Some(&b'\n') => i += 3,
      b'/' if next == Some(b'*') => {
        in_block_comment = true;
        i += 2;
      }
      b'/' if next == Some(b'/') => {
        while i < content.len() && content[i] != b'\n' {
          i += 1;
        }
      }
      b'"' | b'\'' => i = copy_literal(content, i, &mut line),
      b'<' if awaits_target(&line) => i = copy_angle_target(content, i, &mut line),
      b'\n' => {
        if let Some(directive) = parse_line(&line) {
          directives.push(directive);
        }
        line.clear();
        i += 1;
      }
      b'\r' => i += 1,
      _ => {
        line.push(byte);
        i += 1;
      }
    }
  }

  if let Some(directive) = parse_line(&line) {
    directives.push(directive);
  }
  directives
}

/// Copy a quoted literal starting at `start` into `line`, returning the index
/// just past it. Unterminated literals stop before the end of the line.
fn copy_literal(content: &[u8], start: usize, line: &mut Vec<u8>) -> usize {
  let quote = content[start];
  line.push(quote);
  let mut i = start + 1;
  while i < content.len() {
    let byte = content[i];
    if byte == b'\n' {
      break;
    }
    if byte == b'\\' && i + 1 < content.len() && content[i + 1] != b'\n' {
      line.extend_from_slice(&content[i..i + 2]);
      i += 2;
      continue;
    }
    line.push(byte);
    i += 1;
    if byte == quote {
      break;
    }
  }
  i
}

/// Copy an angle-bracket target verbatim, so `//` and `/*` inside it are
/// part of the name. Stops after `>` or before the end of the line.
fn copy_angle_target(content: &[u8], start: usize, line: &mut Vec<u8>) -> usize {
  let mut i = start;
  while i < content.len() && content[i] != b'\n' {
    line.push(content[i]);
    i += 1;
    if content[i - 1] == b'>' {
      break;
    }
  }
  i
}

/// Whether `line` so far is exactly `# keyword` with nothing after it.
fn awaits_target(line: &[u8]) -> bool {
  after_keyword(line).is_some_and(|rest| skip_blanks(rest).is_empty())
}

/// The rest of `line` after `# keyword`, if it opens an include directive.
fn after_keyword(line: &[u8]) -> Option<&[u8]> {
  let rest = skip_blanks(line);
  let rest = skip_blanks(rest.strip_prefix(b"#")?);

  let keyword_len = rest
    .iter()
    .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))
    .unwrap_or(rest.len());
  let (keyword, rest) = rest.split_at(keyword_len);
  DIRECTIVE_KEYWORDS.contains(&keyword).then_some(rest)
}

fn parse_line(line: &[u8]) -> Option<Directive> {
  let rest = skip_blanks(after_keyword(line)?);
  let (form, close) = match *rest.first()? {
    b'"' => (IncludeForm::Quote, b'"'),
    b'<' => (IncludeForm::Angle, b'>'),
    _ => return None,
  };
  let body = &rest[1..];
  let end = body.iter().position(|b| *b == close)?;
  if end == 0 {
    return None;
  }
  let target = std::str::from_utf8(&body[..end]).ok()?;
  Some(Directive {
    form,
    target: target.to_string(),
  })
}

fn skip_blanks(bytes: &[u8]) -> &[u8] {
  let start = bytes
    .iter()
    .position(|b| *b != b' ' && *b != b'\t' && *b != 0x0b && *b != 0x0c)
    .unwrap_or(bytes.len());
  &bytes[start..]
}

//! Path selection for a single dependency.
//!
//! A [`PathFilter`] decides which files below a dependency's `from` directory
//! are kept. It is compiled once from the manifest, before any network call,
//! so that a broken pattern fails the run early.

use std::collections::HashSet;

use regex::Regex;

use crate::error::{Error, Result};

/// Compiled selection policy for one dependency.
#[derive(Debug, Clone)]
pub enum PathFilter {
    /// Keep exactly these paths.
    Files(HashSet<String>),
    /// Keep paths matching `include` and not matching `exclude`.
    Patterns {
        /// `None` includes everything.
        include: Option<Regex>,
        /// `None` excludes nothing.
        exclude: Option<Regex>,
    },
}

impl PathFilter {
    /// Compiles a filter from the manifest fields.
    ///
    /// A non-empty `files` list wins over the patterns. Patterns are trimmed
    /// and anchored so they must match the whole relative path.
    pub fn new(include: &str, exclude: &str, files: &[String]) -> Result<Self> {
        if !files.is_empty() {
            return Ok(PathFilter::Files(files.iter().cloned().collect()));
        }

        Ok(PathFilter::Patterns {
            include: compile_anchored("include", include)?,
            exclude: compile_anchored("exclude", exclude)?,
        })
    }

    /// A filter that keeps every path.
    pub fn all() -> Self {
        PathFilter::Patterns {
            include: None,
            exclude: None,
        }
    }

    /// Returns true if `path` (relative to the dependency's `from`) is kept.
    pub fn keep(&self, path: &str) -> bool {
        match self {
            PathFilter::Files(files) => files.contains(path),
            PathFilter::Patterns { include, exclude } => {
                include.as_ref().map_or(true, |i| i.is_match(path))
                    && !exclude.as_ref().is_some_and(|e| e.is_match(path))
            }
        }
    }
}

/// Wraps `pattern` in `^(?:...)$` unless it already carries both anchors.
///
/// A trailing `\$` is a literal dollar sign, not an anchor.
pub fn anchor(pattern: &str) -> String {
    let leading = pattern.starts_with('^');
    let trailing = ends_with_anchor(pattern);
    if leading && trailing && pattern.len() > 1 {
        return pattern.to_string();
    }
    let inner = if leading { &pattern[1..] } else { pattern };
    let inner = if trailing && !inner.is_empty() {
        &inner[..inner.len() - 1]
    } else {
        inner
    };
    format!("^(?:{})$", inner)
}

/// Whether `pattern` ends in a `$` that is not escaped by a backslash.
fn ends_with_anchor(pattern: &str) -> bool {
    let Some(rest) = pattern.strip_suffix('$') else {
        return false;
    };
    let backslashes = rest.bytes().rev().take_while(|&b| b == b'\\').count();
    backslashes % 2 == 0
}

/// Compiles a trimmed, anchored pattern. Blank patterns compile to `None`.
fn compile_anchored(kind: &'static str, pattern: &str) -> Result<Option<Regex>> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Ok(None);
    }
    Regex::new(&anchor(pattern))
        .map(Some)
        .map_err(|source| Error::InvalidPattern {
            kind,
            pattern: pattern.to_string(),
            source,
        })
}

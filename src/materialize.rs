//! # Materializer
//!
//! Moves staged files into their targets once every dependency has been
//! fetched and the collision check has passed.
//!
//! With `keep_dirs: false` the target of every fetched, pattern-based
//! dependency is removed first, so files deleted upstream disappear locally.
//! Dependencies selected by an explicit `files` list never have their target
//! removed, since it may be shared with unrelated files (for example `to: "."`).
//!
//! Copying is best effort: a file that cannot be copied is logged and the
//! remaining files are still copied.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fsutil;
use crate::staging::{CopyOutcome, Dependency};

/// Files copied and files that failed, per dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Number of files copied, index aligned with the dependencies.
    pub copied: Vec<usize>,
    /// Destination paths that could not be written.
    pub failed: Vec<PathBuf>,
}

impl CopyReport {
    pub fn total_copied(&self) -> usize {
        self.copied.iter().sum()
    }
}

/// Lists the files below `dir` as sorted paths relative to `dir`.
pub fn list_staged(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("error listing files in {}: {}", dir.display(), e),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Lists the staged files of every dependency. Failed dependencies list
/// nothing because none of their files will be copied.
pub fn staged_paths(deps: &[Dependency], outcomes: &[CopyOutcome]) -> Result<Vec<Vec<PathBuf>>> {
    deps.iter()
        .zip(outcomes)
        .map(|(dep, outcome)| {
            if outcome.is_fetched() {
                list_staged(dep.staging_dir())
            } else {
                Ok(Vec::new())
            }
        })
        .collect()
}

/// Copies staged files into their targets.
///
/// `staged` must come from [`staged_paths`] and have passed the collision
/// check. Only a failure to remove a target directory is returned as an
/// error; individual copy failures end up in the report.
pub fn apply(
    deps: &[Dependency],
    outcomes: &[CopyOutcome],
    staged: &[Vec<PathBuf>],
    keep_dirs: bool,
) -> Result<CopyReport> {
    if !keep_dirs {
        for (dep, outcome) in deps.iter().zip(outcomes) {
            if outcome.is_fetched() && dep.config.clear_target {
                clear_target(&dep.target)?;
            }
        }
    }

    let mut report = CopyReport::default();
    for (dep, paths) in deps.iter().zip(staged) {
        let mut copied = 0;
        for path in paths {
            let from = dep.staging_dir().join(path);
            let to = dep.target.join(path);
            match fsutil::copy_file(&from, &to) {
                Ok(()) => copied += 1,
                Err(e) => {
                    warn!("error copying file {}: {}", from.display(), e);
                    report.failed.push(to);
                }
            }
        }
        debug!("copied {} file(s) to {}", copied, dep.target.display());
        report.copied.push(copied);
    }

    Ok(report)
}

fn clear_target(target: &Path) -> Result<()> {
    debug!("removing target directory {}", target.display());
    match fs::remove_dir_all(target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Filesystem {
            message: format!("error removing target directory {}: {}", target.display(), e),
        }),
    }
}

//! # Provenance Records
//!
//! Every successfully fetched dependency carries a [`SourceInfo`]: the commit
//! its files came from, the commit message and the committer. After a real
//! (non-simulated) run, the records of all dependencies are written to
//! `pasta.result.yaml` next to the manifest:
//!
//! ```yaml
//! deps:
//!   - url: https://github.com/audiotool/manual
//!     source_info:
//!       reference: b66b28518c9b5519d6da1b5bf601e665b2aacc63
//!       message: Update images
//!       author:
//!         date: 2024-05-01T10:00:00Z
//!         name: Jane Doe
//!         email: jane@example.com
//!   - url: https://github.com/audiotool/missing
//!     skipped: true
//!     error: "error during copy: ..."
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::defaults::RESULT_FILE_NAME;
use crate::error::{Error, Result};
use crate::staging::{CopyOutcome, Dependency};

/// Where a dependency's files came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Commit SHA the files were read at.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default)]
    pub author: Author,
    /// Selected files that could not be downloaded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_files: Vec<String>,
}

/// Identity and timestamp attached to a commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
}

/// One entry of the result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_info: Option<SourceInfo>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The complete `pasta.result.yaml` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub deps: Vec<ResultEntry>,
}

impl RunRecord {
    /// Builds the record from the outcomes of a run. `outcomes` is index
    /// aligned with `deps`.
    pub fn from_outcomes(deps: &[Dependency], outcomes: &[CopyOutcome]) -> Self {
        let deps = deps
            .iter()
            .zip(outcomes)
            .map(|(dep, outcome)| match outcome {
                CopyOutcome::Fetched(info) => ResultEntry {
                    url: dep.config.url.clone(),
                    source_info: Some(info.clone()),
                    skipped: false,
                    error: None,
                },
                CopyOutcome::Failed(err) => ResultEntry {
                    url: dep.config.url.clone(),
                    source_info: None,
                    skipped: true,
                    error: Some(format!("error during copy: {}", err)),
                },
            })
            .collect();
        Self { deps }
    }

    /// Serializes the record to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Writes the result file into `dir` and returns its path.
pub fn write(dir: &Path, deps: &[Dependency], outcomes: &[CopyOutcome]) -> Result<PathBuf> {
    for (i, (dep, outcome)) in deps.iter().zip(outcomes).enumerate() {
        match outcome {
            CopyOutcome::Fetched(info) => {
                info!("Copied files from {}", dep.config.url);
                if !info.missing_files.is_empty() {
                    warn!(
                        "{} file(s) of {} could not be downloaded",
                        info.missing_files.len(),
                        dep.config.url
                    );
                }
            }
            CopyOutcome::Failed(err) => {
                warn!("error during copy of dependency {}: {}", i, err);
            }
        }
    }

    let content = RunRecord::from_outcomes(deps, outcomes).to_yaml()?;
    let path = dir.join(RESULT_FILE_NAME);
    fs::write(&path, content).map_err(|e| Error::Filesystem {
        message: format!("error saving {}: {}", path.display(), e),
    })?;

    Ok(path)
}

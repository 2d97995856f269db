//! Downloading the selected files of one commit into a staging directory.

use std::sync::{Mutex, PoisonError};

use log::{debug, warn};
use rayon::ThreadPool;
use tokio_util::sync::CancellationToken;

use super::api::{EntryKind, GitHubApi, Tree};
use super::RepoId;
use crate::backend::CopyConfig;
use crate::error::{Error, Result};
use crate::filter::PathFilter;
use crate::fsutil;
use crate::provenance::{Author, SourceInfo};

/// A file to download: its path relative to `from` and its blob SHA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub path: String,
    pub sha: String,
}

/// Picks the blobs below `from` that `filter` keeps.
///
/// Only blobs are considered; directories and submodules are skipped. Paths
/// are returned relative to `from`.
pub fn select_entries(tree: &Tree, from: &str, filter: &PathFilter) -> Vec<Selected> {
    tree.entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Blob)
        .filter_map(|entry| {
            let relative = entry.path.strip_prefix(from)?;
            (!relative.is_empty() && filter.keep(relative)).then(|| Selected {
                path: relative.to_string(),
                sha: entry.sha.clone(),
            })
        })
        .collect()
}

/// Fetches the files `config` selects at commit `sha` into
/// `config.staging_dir`.
///
/// Every download is awaited before the commit metadata is read. A failed
/// download is logged and listed in [`SourceInfo::missing_files`]; it does not
/// fail the dependency.
pub fn fetch(
    api: &dyn GitHubApi,
    downloads: &ThreadPool,
    cancel: &CancellationToken,
    repo: &RepoId,
    sha: &str,
    config: &CopyConfig,
) -> Result<SourceInfo> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let tree = api.tree(repo, sha)?;
    if tree.truncated {
        warn!(
            "{}: tree listing at {} was truncated, some files may be missing",
            repo, sha
        );
    }

    let selected = select_entries(&tree, &config.from, &config.filter);
    debug!("{}: {} file(s) selected", repo, selected.len());

    let missing: Mutex<Vec<String>> = Mutex::new(Vec::new());
    downloads.scope(|scope| {
        for file in &selected {
            let missing = &missing;
            scope.spawn(move |_| {
                if cancel.is_cancelled() {
                    return;
                }
                let result = api.blob(repo, &file.sha).and_then(|content| {
                    fsutil::save_file(&config.staging_dir.join(&file.path), &content)
                });
                if let Err(e) = result {
                    warn!("{}: failed to fetch '{}': {}", repo, file.path, e);
                    missing
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(file.path.clone());
                }
            });
        }
    });

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut missing_files = missing.into_inner().unwrap_or_else(PoisonError::into_inner);
    missing_files.sort();

    let commit = api.commit(repo, sha)?;
    Ok(SourceInfo {
        reference: sha.to_string(),
        message: commit.message,
        author: Author {
            date: commit.committer.date,
            name: commit.committer.name,
            email: commit.committer.email,
        },
        missing_files,
    })
}

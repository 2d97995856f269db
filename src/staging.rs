//! # Staging Coordinator
//!
//! Runs the fetch of every dependency at once and collects one
//! [`CopyOutcome`] per dependency, in declaration order.
//!
//! Each [`Dependency`] owns a private staging directory. Backends write into
//! it and nothing else does, so dependencies never touch each other's files
//! while they are fetched. A failing dependency is recorded and its siblings
//! keep going, whatever the error. Only the caller's cancellation token stops
//! work early.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::backend::{CopyConfig, Registry};
use crate::defaults::STAGING_PREFIX;
use crate::error::{Error, Result};
use crate::provenance::SourceInfo;

/// A dependency ready to be fetched: where it comes from, where it goes,
/// and the staging directory it is fetched into.
#[derive(Debug)]
pub struct Dependency {
    pub config: CopyConfig,
    /// Absolute target directory.
    pub target: PathBuf,
    staging: TempDir,
}

impl Dependency {
    /// Creates the staging directory and points `config` at it.
    pub fn new(mut config: CopyConfig, target: PathBuf) -> Result<Self> {
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .map_err(|e| Error::Filesystem {
                message: format!("Failed to create staging directory: {}", e),
            })?;
        config.staging_dir = staging.path().to_path_buf();
        debug!(
            "staging {} in {}",
            config.url,
            config.staging_dir.display()
        );

        Ok(Self {
            config,
            target,
            staging,
        })
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

/// Result of fetching one dependency.
#[derive(Debug)]
pub enum CopyOutcome {
    Fetched(SourceInfo),
    Failed(Error),
}

impl CopyOutcome {
    pub fn is_fetched(&self) -> bool {
        matches!(self, CopyOutcome::Fetched(_))
    }

    pub fn source_info(&self) -> Option<&SourceInfo> {
        match self {
            CopyOutcome::Fetched(info) => Some(info),
            CopyOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            CopyOutcome::Fetched(_) => None,
            CopyOutcome::Failed(err) => Some(err),
        }
    }
}

/// Fetches every dependency concurrently.
///
/// The returned outcomes are index aligned with `deps`. Per-dependency
/// failures are outcomes, not errors; `Err` is only returned when the worker
/// pool cannot be started.
pub fn stage_all(
    registry: &Registry,
    deps: &[Dependency],
    cancel: &CancellationToken,
) -> Result<Vec<CopyOutcome>> {
    if deps.is_empty() {
        return Ok(Vec::new());
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(deps.len())
        .thread_name(|i| format!("pasta-source-{}", i))
        .build()
        .map_err(|e| Error::Filesystem {
            message: format!("failed to start fetch workers: {}", e),
        })?;

    let outcomes: Vec<CopyOutcome> = pool.install(|| {
        deps.par_iter()
            .enumerate()
            .map(|(index, dep)| stage_one(registry, index, dep, cancel))
            .collect()
    });

    Ok(outcomes)
}

fn stage_one(
    registry: &Registry,
    index: usize,
    dep: &Dependency,
    cancel: &CancellationToken,
) -> CopyOutcome {
    if cancel.is_cancelled() {
        return CopyOutcome::Failed(Error::Cancelled);
    }

    let result = registry
        .find(&dep.config.url)
        .and_then(|backend| {
            info!("Fetching {} ({})", dep.config.url, backend.name());
            backend.copy(cancel, &dep.config)
        });

    match result {
        Ok(info) => CopyOutcome::Fetched(info),
        Err(err) => {
            warn!("dependency {} ({}) failed: {}", index, dep.config.url, err);
            CopyOutcome::Failed(err)
        }
    }
}

/// Removes every staging directory. All directories are attempted; the
/// failures are joined into one [`Error::Cleanup`].
pub fn release(deps: Vec<Dependency>) -> Result<()> {
    let failures: Vec<String> = deps
        .into_iter()
        .filter_map(|dep| {
            let path = dep.staging.path().display().to_string();
            dep.staging
                .close()
                .err()
                .map(|e| format!("{}: {}", path, e))
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::Cleanup {
            message: format!(
                "failed to remove staging directories: {}",
                failures.join("; ")
            ),
        })
    }
}

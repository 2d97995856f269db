//! # Run Pipeline
//!
//! One run of pasta, from prepared dependencies to the result file:
//!
//! 1.  **Stage**: every dependency is fetched into its staging directory
//!     ([`staging::stage_all`]).
//! 2.  **Check**: the staged files of all fetched dependencies are checked for
//!     collisions. Nothing on disk has been touched yet, so a collision
//!     aborts the run cleanly.
//! 3.  **Materialize**: targets are cleaned and staged files are copied
//!     ([`materialize::apply`]).
//! 4.  **Record**: `pasta.result.yaml` is written next to the manifest.
//! 5.  **Release**: staging directories are removed, whatever happened before.
//!
//! In simulation mode steps 3 and 4 are replaced by a report on stdout.

use std::io::Write;
use std::path::PathBuf;

use log::{error, info};
use tokio_util::sync::CancellationToken;

use crate::backend::Registry;
use crate::collision;
use crate::error::{Error, Result};
use crate::materialize;
use crate::output::OutputConfig;
use crate::provenance::{self, RunRecord};
use crate::report;
use crate::staging::{self, CopyOutcome, Dependency};

/// Options for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Report what would happen instead of doing it.
    pub simulate: bool,
    /// Keep existing files in target directories.
    pub keep_dirs: bool,
    /// Directory that receives the result file, normally the manifest's.
    pub result_dir: PathBuf,
    pub output: OutputConfig,
}

impl RunOptions {
    pub fn new(result_dir: impl Into<PathBuf>) -> Self {
        Self {
            simulate: false,
            keep_dirs: false,
            result_dir: result_dir.into(),
            output: OutputConfig::plain(),
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// One entry per dependency, as written to the result file.
    pub record: RunRecord,
    /// Files copied per dependency. All zero in simulation mode.
    pub copied: Vec<usize>,
    /// Path of the result file, `None` in simulation mode.
    pub result_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn fetched(&self) -> usize {
        self.record.deps.iter().filter(|d| !d.skipped).count()
    }
}

/// Runs the pipeline over `deps`, writing reports to `out`.
///
/// Per-dependency failures are recorded, not returned, unless every
/// dependency failed ([`Error::AllSourcesFailed`]). A cleanup failure is
/// returned only when the run itself succeeded; otherwise it is logged and
/// the run's error wins.
pub fn run(
    registry: &Registry,
    deps: Vec<Dependency>,
    options: &RunOptions,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    let result = execute(registry, &deps, options, cancel, out);
    let cleanup = staging::release(deps);

    match (result, cleanup) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(cleanup_err)) => Err(cleanup_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            error!("{}", cleanup_err);
            Err(err)
        }
    }
}

fn execute(
    registry: &Registry,
    deps: &[Dependency],
    options: &RunOptions,
    cancel: &CancellationToken,
    out: &mut dyn Write,
) -> Result<RunSummary> {
    let outcomes = staging::stage_all(registry, deps, cancel)?;
    if outcomes.iter().any(is_hard_failure) {
        return Err(aborted(deps, &outcomes));
    }
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let staged = materialize::staged_paths(deps, &outcomes)?;
    let collision = collision::check(&staged);

    if options.simulate {
        report::dry_run(
            out,
            &options.output,
            deps,
            &outcomes,
            &staged,
            collision.as_ref().err(),
        )?;
        collision?;
        check_any_fetched(&outcomes)?;
        return Ok(RunSummary {
            record: RunRecord::from_outcomes(deps, &outcomes),
            copied: vec![0; deps.len()],
            result_file: None,
        });
    }

    collision?;

    let copy_report = materialize::apply(deps, &outcomes, &staged, options.keep_dirs)?;
    let result_file = provenance::write(&options.result_dir, deps, &outcomes)?;
    info!("wrote {}", result_file.display());

    report::summary(
        out,
        &options.output,
        deps,
        &outcomes,
        &copy_report.copied,
        Some(&result_file),
    )?;

    check_any_fetched(&outcomes)?;
    Ok(RunSummary {
        record: RunRecord::from_outcomes(deps, &outcomes),
        copied: copy_report.copied,
        result_file: Some(result_file),
    })
}

/// A failure that is not local to its dependency (a broken staging
/// directory, for example) ends the run once every sibling has finished,
/// before anything is copied.
fn is_hard_failure(outcome: &CopyOutcome) -> bool {
    outcome.error().is_some_and(|err| !err.is_source_local())
}

/// Collects the failure of every dependency, so that none is hidden behind
/// the one that ended the run.
fn aborted(deps: &[Dependency], outcomes: &[CopyOutcome]) -> Error {
    let failures = deps
        .iter()
        .zip(outcomes)
        .filter_map(|(dep, outcome)| {
            outcome
                .error()
                .map(|err| format!("{}: {}", dep.config.url, err))
        })
        .collect();
    Error::RunAborted { failures }
}

fn check_any_fetched(outcomes: &[CopyOutcome]) -> Result<()> {
    if !outcomes.is_empty() && !outcomes.iter().any(CopyOutcome::is_fetched) {
        return Err(Error::AllSourcesFailed {
            count: outcomes.len(),
        });
    }
    Ok(())
}

//! Human-readable reports printed to stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::output::OutputConfig;
use crate::staging::{CopyOutcome, Dependency};

/// Prints what a real run would do, without touching anything.
///
/// `collision` is the result of the collision check, shown after the
/// per-dependency listing so the offending files are visible above it.
pub fn dry_run(
    out: &mut dyn Write,
    output: &OutputConfig,
    deps: &[Dependency],
    outcomes: &[CopyOutcome],
    staged: &[Vec<PathBuf>],
    collision: Option<&Error>,
) -> io::Result<()> {
    for ((dep, outcome), paths) in deps.iter().zip(outcomes).zip(staged) {
        writeln!(out, "{}", output.heading(format!("Dependency {}:", dep.config.url)))?;
        match outcome {
            CopyOutcome::Failed(err) => {
                writeln!(out, "  Would skip:")?;
                for line in err.to_string().lines() {
                    writeln!(out, "    {}", output.failure(line))?;
                }
            }
            CopyOutcome::Fetched(info) => {
                writeln!(out, "  Would copy to {}:", dep.target.display())?;
                for path in paths {
                    writeln!(out, "    * {}", path.display())?;
                }
                writeln!(out, "  Would record:")?;
                let yaml = serde_yaml::to_string(info).map_err(io::Error::other)?;
                for line in yaml.lines() {
                    writeln!(out, "    {}", output.dim(line))?;
                }
            }
        }
        writeln!(out)?;
    }

    if let Some(err) = collision {
        writeln!(out, "{} {}", output.failure("Wouldn't copy:"), err)?;
    }
    Ok(())
}

/// Prints one line per dependency and the totals after a real run.
pub fn summary(
    out: &mut dyn Write,
    output: &OutputConfig,
    deps: &[Dependency],
    outcomes: &[CopyOutcome],
    copied: &[usize],
    result_file: Option<&Path>,
) -> io::Result<()> {
    let mut fetched = 0;
    for (i, (dep, outcome)) in deps.iter().zip(outcomes).enumerate() {
        match outcome {
            CopyOutcome::Fetched(info) => {
                fetched += 1;
                let count = copied.get(i).copied().unwrap_or_default();
                writeln!(
                    out,
                    "{} Copied {} file(s) from {} {}",
                    output.success("✓"),
                    count,
                    dep.config.url,
                    output.dim(format!("@ {}", short_sha(&info.reference)))
                )?;
                if !info.missing_files.is_empty() {
                    writeln!(
                        out,
                        "  {} {} file(s) could not be downloaded",
                        output.failure("!"),
                        info.missing_files.len()
                    )?;
                }
            }
            CopyOutcome::Failed(err) => {
                writeln!(
                    out,
                    "{} Skipped {}: {}",
                    output.failure("✗"),
                    dep.config.url,
                    err
                )?;
            }
        }
    }

    writeln!(
        out,
        "{} of {} dependencies fetched, {} file(s) copied",
        fetched,
        deps.len(),
        copied.iter().sum::<usize>()
    )?;
    if let Some(path) = result_file {
        writeln!(out, "Wrote {}", path.display())?;
    }
    Ok(())
}

fn short_sha(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}

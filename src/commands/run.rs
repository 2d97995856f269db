//! # Run Command Implementation
//!
//! The default action of `pasta`: find the manifest, fetch every dependency,
//! and copy the selected files into place (or, with `--dry-run`, print what
//! would be copied).

use anyhow::{Context, Result};
use clap::Args;
use log::{info, warn};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use pasta::backend::Registry;
use pasta::defaults;
use pasta::exit_codes;
use pasta::manifest;
use pasta::output::OutputConfig;
use pasta::pipeline::{self, RunOptions};
use pasta::settings::Settings;

/// Arguments of a run
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Don't do anything, just print what would be done
    #[arg(long)]
    pub dry_run: bool,

    /// Path to the manifest (default: nearest pasta.yaml in this or a parent directory)
    #[arg(short, long, value_name = "PATH", env = "PASTA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Token for the GitHub API
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub API
    #[arg(long, value_name = "URL", env = "PASTA_GITHUB_API_URL", default_value = defaults::GITHUB_API_URL)]
    pub github_api_url: String,

    /// Maximum number of files downloaded at once
    #[arg(long, value_name = "N", env = "PASTA_CONCURRENCY", default_value_t = defaults::DOWNLOAD_CONCURRENCY)]
    pub concurrency: usize,

    /// Timeout of a single HTTP request, in seconds
    #[arg(long, value_name = "SECONDS", env = "PASTA_HTTP_TIMEOUT", default_value_t = defaults::HTTP_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl RunArgs {
    fn settings(&self) -> Settings {
        Settings::default()
            .with_token(self.github_token.clone())
            .with_api_url(&self.github_api_url)
            .with_concurrency(self.concurrency)
            .with_timeout(Duration::from_secs(self.timeout))
    }

    fn manifest_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        let cwd = std::env::current_dir().context("could not get working directory")?;
        Ok(manifest::discover(&cwd)?)
    }
}

/// Execute a run.
pub fn execute(args: RunArgs, output: OutputConfig) -> Result<()> {
    let manifest_path = args.manifest_path()?;
    info!("using {}", manifest_path.display());

    let manifest = manifest::from_file(&manifest_path)?;
    if manifest.deps.is_empty() {
        println!("No dependencies found in '{}'", manifest_path.display());
        return Ok(());
    }

    let settings = args.settings();
    let registry = Registry::with_defaults(&settings)?;
    let deps = manifest.prepare(&manifest_path)?;

    if args.dry_run {
        println!("--dry-run is set, here's what would happen:");
        println!();
    }

    let result_dir = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let options = RunOptions {
        simulate: args.dry_run,
        keep_dirs: manifest.keep_dirs,
        result_dir,
        output,
    };

    let cancel = CancellationToken::new();
    install_interrupt_handler(&cancel);
    let stdout = io::stdout();
    pipeline::run(&registry, deps, &options, &cancel, &mut stdout.lock())?;
    Ok(())
}

/// The first Ctrl-C cancels the run: no new downloads start, staging is
/// released and pasta exits with [`exit_codes::CANCELLED`]. A second one
/// exits immediately.
fn install_interrupt_handler(cancel: &CancellationToken) {
    let token = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if request_stop(&token) {
            std::process::exit(exit_codes::CANCELLED);
        }
        eprintln!("Interrupted, finishing in-flight requests (press Ctrl-C again to quit now)");
    });
    if let Err(e) = installed {
        warn!("could not install interrupt handler: {}", e);
    }
}

/// Cancels `cancel` and returns whether it had already been cancelled.
fn request_stop(cancel: &CancellationToken) -> bool {
    let already = cancel.is_cancelled();
    cancel.cancel();
    already
}

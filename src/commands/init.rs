//! # Init Command Implementation
//!
//! Creates a commented starter `pasta.yaml` in the current directory. An
//! existing manifest is never overwritten unless `--force` is given, and a
//! manifest in a parent directory is pointed out, since it would otherwise
//! have been the one pasta picks up.

use anyhow::{bail, Context, Result};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use pasta::defaults::MANIFEST_FILE_NAME;
use pasta::manifest;

const TEMPLATE: &str = r#"keep_dirs: true
#deps:
#- url: https://github.com/audiotool/manual
#  from: images/
#  to: my/local/path/
#  include: pulverisateur.\.png # regex
#  exclude: # regex
#  options:
#    ref: "branchname" # can be "heads/<branchname>" "tags/<tagname>" "commit/<commitsha>" or simply "<name>"
"#;

/// Create a starter pasta.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing pasta.yaml
    #[arg(short, long)]
    pub force: bool,
}

/// Execute the `init` command.
pub fn execute(args: InitArgs) -> Result<()> {
    let dir = std::env::current_dir().context("could not get working directory")?;
    let path = init_in(&dir, args.force)?;
    println!("Created '{}'", path.display());
    Ok(())
}

/// Writes the starter manifest into `dir` and returns its path.
fn init_in(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(MANIFEST_FILE_NAME);
    if path.exists() && !force {
        bail!("'{}' already exists. Use --force to overwrite.", path.display());
    }

    if let Some(parent) = dir.parent() {
        if let Ok(existing) = manifest::discover(parent) {
            println!("Warning: Found a pasta file on '{}'", existing.display());
        }
    }

    fs::write(&path, TEMPLATE)
        .with_context(|| format!("could not create pasta file {}", path.display()))?;
    Ok(path)
}

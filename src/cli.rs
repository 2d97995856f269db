//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;
use pasta::output::{ColorChoice, OutputConfig};

/// pasta - copy files between repositories
///
/// Without a subcommand, fetches every dependency listed in the nearest
/// pasta.yaml and copies the selected files into place.
#[derive(Parser, Debug)]
#[command(name = "pasta")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: commands::run::RunArgs,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a starter pasta.yaml in the current directory
    Init(commands::init::InitArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::new(self.color);

        match self.command {
            Some(Commands::Init(args)) => commands::init::execute(args),
            Some(Commands::Completions(args)) => commands::completions::execute(args),
            None => commands::run::execute(self.run, output),
        }
    }
}

/// Logs go to stderr. `RUST_LOG` takes precedence over `--log-level`.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when running inside tests.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

//! # pasta CLI
//!
//! This is the binary entry point for the `pasta` command-line tool.
//!
//! Its responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the selected command.
//! - Printing top-level errors and turning them into the process exit status
//!   defined in [`pasta::exit_codes`].
//!
//! All of the actual work lives in the library crate.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use pasta::exit_codes;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<pasta::Error>()
                .map(pasta::Error::exit_code)
                .unwrap_or(exit_codes::FAILURE);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

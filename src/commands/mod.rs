//! # CLI Command Implementations
//!
//! Each command lives in its own file with an `Args` struct derived with
//! `clap` and an `execute` function that calls into the `pasta` library.
//!
//! - `run`: the default action, fetch and copy every dependency
//! - `init`: write a starter manifest
//! - `completions`: print shell completions

pub mod completions;
pub mod init;
pub mod run;

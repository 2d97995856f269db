//! # pasta
//!
//! Vendors files from remote repositories into a local tree. A `pasta.yaml`
//! manifest lists the sources; each run fetches the selected files at a
//! pinned commit, makes sure no two sources write the same file, copies them
//! into place and records where every file came from in
//! `pasta.result.yaml`.
//!
//! ## Quick Example
//!
//! ```
//! use pasta::manifest::Manifest;
//!
//! let manifest = Manifest::parse(r#"
//! deps:
//!   - url: https://github.com/audiotool/manual
//!     from: images/
//!     to: assets/
//!     include: .*\.png
//!     options:
//!       ref: heads/main
//! "#).unwrap();
//!
//! assert_eq!(manifest.deps.len(), 1);
//! assert!(manifest.deps[0].filter().unwrap().keep("logo.png"));
//! assert!(!manifest.deps[0].filter().unwrap().keep("sub/logo.svg"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: the `pasta.yaml` schema, its validation and
//!   discovery.
//! - **Path filter (`filter`)**: decides which files of a source are kept.
//! - **Backends (`backend`, `github`)**: fetch files from one kind of remote.
//!   The [`backend::Registry`] picks the backend that claims a URL.
//! - **Staging (`staging`)**: fetches every source concurrently into private
//!   staging directories.
//! - **Collision check (`collision`)**, **materializer (`materialize`)** and
//!   **provenance (`provenance`)**: the steps that turn staged files into the
//!   final tree and its record.
//!
//! ## Execution Flow
//!
//! [`pipeline::run`] ties it together: stage, check for collisions, copy,
//! record, and finally release the staging directories.

pub mod backend;
pub mod collision;
pub mod defaults;
pub mod error;
pub mod exit_codes;
pub mod filter;
pub mod fsutil;
pub mod github;
pub mod manifest;
pub mod materialize;
pub mod output;
pub mod pipeline;
pub mod provenance;
pub mod report;
pub mod settings;
pub mod staging;

#[cfg(test)]
mod filter_proptest;

pub use error::{Error, Result};
